//! Plan feedback records: the append-only input of weight learning

use crate::models::lenient;
use crate::models::normalize_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A user's verdict on a generated campaign plan.
///
/// Created on submission and never mutated. Every field except `plan_id` is
/// parsed leniently: a malformed value reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub plan_id: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub plan_data: PlanData,
    #[serde(
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub overall_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub dimensional_feedback: DimensionalFeedback,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub edits: PlanEdits,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub approved: bool,
}

impl FeedbackRecord {
    pub fn new(plan_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            timestamp: Utc::now(),
            plan_id: plan_id.into(),
            plan_data: PlanData::default(),
            overall_rating: None,
            dimensional_feedback: DimensionalFeedback::default(),
            edits: PlanEdits::default(),
            approved: false,
        }
    }

    /// Rating used for one dimension: the dimension's own rating, else the
    /// overall rating, else `default`
    pub fn rating_for(&self, dimension: RatingDimension, default: f64) -> f64 {
        self.dimensional_feedback
            .rating(dimension)
            .or(self.overall_rating)
            .unwrap_or(default)
    }

    /// Normalized vertical key, if the plan carried one
    pub fn vertical_key(&self) -> Option<String> {
        self.plan_data
            .vertical_key
            .as_deref()
            .map(normalize_key)
            .filter(|k| !k.is_empty())
    }
}

/// Snapshot of the plan the feedback refers to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanData {
    #[serde(default, deserialize_with = "lenient::seq")]
    pub audiences: Vec<AudienceSelection>,
    #[serde(
        default,
        rename = "lineItems",
        alias = "line_items",
        deserialize_with = "lenient::seq"
    )]
    pub line_items: Vec<LineItem>,
    #[serde(default, deserialize_with = "lenient::seq")]
    pub formats: Vec<FormatSelection>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub vertical_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceSelection {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub persona: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
}

impl AudienceSelection {
    pub fn persona(name: impl Into<String>) -> Self {
        Self {
            persona: Some(name.into()),
            name: None,
        }
    }

    /// `persona` wins over `name`
    pub fn key(&self) -> Option<String> {
        self.persona
            .as_deref()
            .or(self.name.as_deref())
            .map(normalize_key)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget: Option<f64>,
}

impl LineItem {
    pub fn platform(platform: impl Into<String>, budget: f64) -> Self {
        Self {
            platform: Some(platform.into()),
            budget: Some(budget),
        }
    }

    pub fn key(&self) -> Option<String> {
        self.platform
            .as_deref()
            .map(normalize_key)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatSelection {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "Ad format",
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub ad_format: Option<String>,
}

impl FormatSelection {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ad_format: None,
        }
    }

    pub fn key(&self) -> Option<String> {
        self.name
            .as_deref()
            .or(self.ad_format.as_deref())
            .map(normalize_key)
            .filter(|k| !k.is_empty())
    }
}

/// Plan dimension a rating refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingDimension {
    Audience,
    Budget,
    Platform,
    Format,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionalFeedback {
    #[serde(
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub audience_rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub budget_rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform_rating: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub format_rating: Option<f64>,
    /// Issue checkboxes (`budget_too_high`, `wrong_audience`, ...) kept verbatim
    #[serde(flatten)]
    pub issues: BTreeMap<String, Value>,
}

impl DimensionalFeedback {
    pub fn rating(&self, dimension: RatingDimension) -> Option<f64> {
        match dimension {
            RatingDimension::Audience => self.audience_rating,
            RatingDimension::Budget => self.budget_rating,
            RatingDimension::Platform => self.platform_rating,
            RatingDimension::Format => self.format_rating,
        }
    }

    /// Names of the issue flags that were ticked
    pub fn flagged_issues(&self) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|(_, v)| v.as_bool().unwrap_or(false))
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Edits the user made to the generated plan before rating it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanEdits {
    #[serde(default, deserialize_with = "lenient::name_list")]
    pub audiences_added: Vec<String>,
    #[serde(default, deserialize_with = "lenient::name_list")]
    pub audiences_removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub budget_changes: Value,
}
