//! Reference tables: personas, format inventory, format catalogue and sites.
//!
//! Loaded once at startup and shared read-only afterwards.

use crate::models::{
    AdFormat, FormatCatalogue, FormatInventoryRecord, InventoryTable, Persona, Site,
};
use crate::reach::{CategoryKeywords, PersonaTable};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const NAME_COLUMNS: [&str; 4] = ["Persona", "persona", "Name", "name"];
/// Columns that are not per-state counts and must not be summed
const NON_STATE_COLUMNS: [&str; 3] = ["total", "category", "national"];

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed reference data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Backend audience endpoint payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceTable {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub data: Vec<Value>,
}

/// All reference tables in one JSON document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceDataBundle {
    #[serde(default)]
    pub audiences: AudienceTable,
    #[serde(default)]
    pub inventory: HashMap<String, FormatInventoryRecord>,
    #[serde(default)]
    pub formats: Vec<AdFormat>,
    #[serde(default)]
    pub sites: Vec<Site>,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub personas: PersonaTable,
    pub inventory: InventoryTable,
    pub formats: FormatCatalogue,
    pub sites: Vec<Site>,
}

impl ReferenceData {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bundle(bundle: ReferenceDataBundle, categories: &CategoryKeywords) -> Self {
        Self {
            personas: parse_audience_table(&bundle.audiences, categories),
            inventory: InventoryTable::from_records(bundle.inventory),
            formats: FormatCatalogue::new(bundle.formats),
            sites: bundle.sites,
        }
    }
}

/// Parse comma-formatted counts such as "1,234,567". Anything unreadable is 0.
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => {
            let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
            cleaned
                .parse::<u64>()
                .ok()
                .or_else(|| {
                    cleaned
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite() && *f > 0.0)
                        .map(|f| f.round() as u64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Build the persona table from `{headers, data}`. Rows are objects keyed by
/// header, or arrays aligned with `headers`. National size is the sum of the
/// state columns; rows without a name are dropped.
pub fn parse_audience_table(table: &AudienceTable, categories: &CategoryKeywords) -> PersonaTable {
    let mut personas = Vec::with_capacity(table.data.len());

    for row in &table.data {
        let cells: Vec<(&str, &Value)> = match row {
            Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            Value::Array(values) => table
                .headers
                .iter()
                .map(String::as_str)
                .zip(values.iter())
                .collect(),
            _ => continue,
        };

        let name = cells
            .iter()
            .find(|(column, _)| NAME_COLUMNS.contains(column))
            .and_then(|(_, v)| v.as_str())
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let Some(name) = name else {
            continue;
        };

        let breakdown: BTreeMap<String, u64> = cells
            .iter()
            .filter(|(column, _)| {
                !NAME_COLUMNS.contains(column)
                    && !NON_STATE_COLUMNS.contains(&column.to_lowercase().as_str())
            })
            .map(|(column, value)| (column.to_string(), parse_count(value)))
            .collect();
        let size = breakdown.values().sum();

        personas.push(
            Persona::new(name, categories.resolve(name), size).with_state_breakdown(breakdown),
        );
    }

    PersonaTable::new(personas)
}

#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn load(&self) -> Result<ReferenceData, ReferenceDataError>;
}

/// Fetches the tables from the planning backend over HTTP
pub struct HttpReferenceDataProvider {
    base_url: String,
    client: reqwest::Client,
    categories: CategoryKeywords,
}

impl HttpReferenceDataProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ReferenceDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|source| ReferenceDataError::Http {
                url: "<client>".to_string(),
                source,
            })?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            categories: CategoryKeywords::default(),
        }
    }

    pub fn with_categories(mut self, categories: CategoryKeywords) -> Self {
        self.categories = categories;
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ReferenceDataError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ReferenceDataError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReferenceDataError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ReferenceDataError::Http {
                url: url.clone(),
                source,
            })?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Optional tables degrade to empty instead of failing startup
    async fn get_optional<T>(&self, path: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.get_json(path).await {
            Ok(value) => value,
            Err(e) => {
                warn!(path = path, error = %e, "Reference table unavailable, using empty table");
                T::default()
            }
        }
    }
}

#[async_trait]
impl ReferenceDataProvider for HttpReferenceDataProvider {
    async fn load(&self) -> Result<ReferenceData, ReferenceDataError> {
        let audiences: AudienceTable = self.get_json("/api/audiences").await?;
        let inventory: HashMap<String, FormatInventoryRecord> =
            self.get_json("/api/inventory").await?;
        let formats: Vec<AdFormat> = self.get_optional("/api/formats").await;
        let sites: Vec<Site> = self.get_optional("/api/sites").await;

        let data = ReferenceData::from_bundle(
            ReferenceDataBundle {
                audiences,
                inventory,
                formats,
                sites,
            },
            &self.categories,
        );
        info!(
            personas = data.personas.len(),
            inventory_keys = data.inventory.len(),
            formats = data.formats.len(),
            sites = data.sites.len(),
            "Reference data loaded from {}",
            self.base_url
        );
        Ok(data)
    }
}

/// Reads a `ReferenceDataBundle` JSON document from disk
pub struct FileReferenceDataProvider {
    path: PathBuf,
    categories: CategoryKeywords,
}

impl FileReferenceDataProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            categories: CategoryKeywords::default(),
        }
    }
}

#[async_trait]
impl ReferenceDataProvider for FileReferenceDataProvider {
    async fn load(&self) -> Result<ReferenceData, ReferenceDataError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let bundle: ReferenceDataBundle = serde_json::from_slice(&bytes)?;
        let data = ReferenceData::from_bundle(bundle, &self.categories);
        info!(
            path = %self.path.display(),
            personas = data.personas.len(),
            inventory_keys = data.inventory.len(),
            "Reference data loaded from file"
        );
        Ok(data)
    }
}
