//! Ad format catalogue, monthly inventory history and the site list

use crate::models::normalize_key;
use crate::models::persona::PersonaCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Yearly request/impression totals for one content language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInventory {
    pub language: String,
    #[serde(default)]
    pub total_requests: f64,
    #[serde(default)]
    pub total_impressions: f64,
}

/// Monthly request and impression history for one inventory key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInventoryRecord {
    #[serde(default)]
    pub format_key: String,
    #[serde(default)]
    pub avg_monthly_requests: f64,
    #[serde(default)]
    pub avg_monthly_impressions: f64,
    #[serde(default)]
    pub by_language: Vec<LanguageInventory>,
}

/// Inventory records keyed by normalized format key
#[derive(Debug, Clone, Default)]
pub struct InventoryTable {
    records: HashMap<String, FormatInventoryRecord>,
}

impl InventoryTable {
    /// Build from the backend's `formatKey → record` map. Keys are normalized;
    /// a record's own `format_key` is filled in when missing.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, FormatInventoryRecord)>,
    {
        let records = records
            .into_iter()
            .map(|(key, mut record)| {
                if record.format_key.is_empty() {
                    record.format_key = key.clone();
                }
                (normalize_key(&key), record)
            })
            .collect();
        Self { records }
    }

    pub fn get(&self, key: &str) -> Option<&FormatInventoryRecord> {
        self.records.get(&normalize_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Standard,
    /// Rich-media units whose inventory is pooled from the standard display formats
    Interactive,
    Video,
    Social,
    #[serde(other)]
    Other,
}

/// One entry of the ad format catalogue offered in the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdFormat {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub format_type: FormatType,
}

impl AdFormat {
    pub fn new(id: impl Into<String>, name: impl Into<String>, format_type: FormatType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            format_type,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormatCatalogue {
    formats: Vec<AdFormat>,
}

impl FormatCatalogue {
    pub fn new(formats: Vec<AdFormat>) -> Self {
        Self { formats }
    }

    /// Look a format up by catalogue id, falling back to a case-insensitive name match
    pub fn get(&self, id_or_name: &str) -> Option<&AdFormat> {
        self.formats.iter().find(|f| f.id == id_or_name).or_else(|| {
            let wanted = normalize_key(id_or_name);
            self.formats.iter().find(|f| normalize_key(&f.name) == wanted)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &AdFormat> {
        self.formats.iter()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// A publisher site that can carry a campaign
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    #[serde(default)]
    pub category: PersonaCategory,
    #[serde(default)]
    pub monthly_impressions: u64,
}
