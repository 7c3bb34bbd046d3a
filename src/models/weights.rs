//! Persisted learning weights document

use crate::models::normalize_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated performance of one persona, platform or format.
///
/// `normalized_score` stays in [0, 1] (0.5 is neutral) and
/// `confidence = min(selection_count / high_confidence_count, 1)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityScore {
    pub success_score: f64,
    pub selection_count: u32,
    #[serde(default)]
    pub edit_count: u32,
    pub total_rating: f64,
    pub avg_rating: f64,
    pub removal_count: u32,
    pub removal_rate: f64,
    pub confidence: f64,
    pub normalized_score: f64,
}

/// Entry of a frequency-ranked list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedKey {
    pub key: String,
    pub count: u32,
}

/// Per-vertical plan statistics. Recomputed from scratch on every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerticalStats {
    pub total_plans: u32,
    pub approved_plans: u32,
    pub total_rating: f64,
    pub avg_rating: f64,
    pub approval_rate: f64,
    #[serde(default)]
    pub top_personas_added: Vec<RankedKey>,
    #[serde(default)]
    pub top_personas_removed: Vec<RankedKey>,
    #[serde(default)]
    pub top_platforms: Vec<RankedKey>,
}

/// The singleton weights document consumed by recommendation ranking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningWeights {
    #[serde(default)]
    pub personas: BTreeMap<String, EntityScore>,
    #[serde(default)]
    pub platforms: BTreeMap<String, EntityScore>,
    #[serde(default)]
    pub formats: BTreeMap<String, EntityScore>,
    #[serde(default)]
    pub verticals: BTreeMap<String, VerticalStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl LearningWeights {
    pub fn persona(&self, name: &str) -> Option<&EntityScore> {
        self.personas.get(&normalize_key(name))
    }

    pub fn vertical(&self, key: &str) -> Option<&VerticalStats> {
        self.verticals.get(&normalize_key(key))
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
            && self.platforms.is_empty()
            && self.formats.is_empty()
            && self.verticals.is_empty()
    }
}
