//! Audience personas and the demographic/geographic filters applied to them

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Topical category of a persona (or a site), derived by keyword match
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum PersonaCategory {
    Entertainment,
    Sports,
    Lifestyle,
    Technology,
    Business,
    Luxury,
    #[default]
    #[serde(other)]
    Other,
}

impl PersonaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaCategory::Entertainment => "Entertainment",
            PersonaCategory::Sports => "Sports",
            PersonaCategory::Lifestyle => "Lifestyle",
            PersonaCategory::Technology => "Technology",
            PersonaCategory::Business => "Business",
            PersonaCategory::Luxury => "Luxury",
            PersonaCategory::Other => "Other",
        }
    }
}

impl fmt::Display for PersonaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named audience segment with its national reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub category: PersonaCategory,
    /// National reach: sum of every state column
    pub size: u64,
    /// Audience per state, as published by the audience endpoint
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub state_breakdown: BTreeMap<String, u64>,
}

impl Persona {
    pub fn new(name: impl Into<String>, category: PersonaCategory, size: u64) -> Self {
        Self {
            name: name.into(),
            category,
            size,
            state_breakdown: BTreeMap::new(),
        }
    }

    pub fn with_state_breakdown(mut self, breakdown: BTreeMap<String, u64>) -> Self {
        self.state_breakdown = breakdown;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    Malay,
    Chinese,
    Indian,
    /// Any label the share table does not know; contributes a zero share
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Generation {
    #[serde(alias = "Gen Z")]
    GenZ,
    Millennials,
    #[serde(alias = "Gen X")]
    GenX,
    Boomers,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IncomeGroup {
    B40,
    M40,
    T20,
    #[serde(other)]
    Other,
}

/// Demographic narrowing. An empty set means "no filter" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicFilter {
    #[serde(default)]
    pub race: BTreeSet<Race>,
    #[serde(default)]
    pub generation: BTreeSet<Generation>,
    #[serde(default)]
    pub income: BTreeSet<IncomeGroup>,
}

impl DemographicFilter {
    pub fn is_empty(&self) -> bool {
        self.race.is_empty() && self.generation.is_empty() && self.income.is_empty()
    }
}

/// State selection. Empty, or containing an "all states" marker, is nationwide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographyFilter {
    #[serde(default, alias = "selectedStates")]
    pub selected_states: BTreeSet<String>,
}

impl GeographyFilter {
    pub fn states<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selected_states: states.into_iter().map(Into::into).collect(),
        }
    }

    /// True when the selection is empty or explicitly asks for every state
    pub fn is_nationwide(&self) -> bool {
        self.selected_states.is_empty()
            || self.selected_states.iter().any(|s| {
                matches!(
                    s.trim().to_lowercase().as_str(),
                    "all" | "all states" | "nationwide"
                )
            })
    }
}
