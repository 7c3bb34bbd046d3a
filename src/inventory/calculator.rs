//! Sellable impression estimate for a format selection

use crate::inventory::config::InventoryConfig;
use crate::inventory::resolver::FormatKeyResolver;
use crate::models::{AdFormat, FormatCatalogue, FormatInventoryRecord, FormatType, InventoryTable};
use crate::reach::resolver::PersonaTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRequest {
    #[serde(default)]
    pub selected_format_ids: Vec<String>,
    #[serde(default)]
    pub target_languages: Vec<String>,
    /// Persona names driving the targeting ratio
    #[serde(default, alias = "selectedPersonaNames")]
    pub personas: Vec<String>,
    #[serde(default)]
    pub mass_targeting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    Available,
    NoInventoryData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInventoryBreakdown {
    pub format_id: String,
    pub format_name: String,
    pub inventory_keys: Vec<String>,
    pub requests: u64,
    pub impressions: u64,
    pub available_inventory: u64,
    pub status: InventoryStatus,
    /// Impressions exceeded requests and the availability was clamped to 0
    pub clamped_negative: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEstimate {
    pub total_requests: u64,
    pub total_impressions: u64,
    /// After the safety buffer and the persona ratio. Computed from the summed
    /// requests and impressions, so an oversold format eats into the others
    /// and this can be lower than the sum of `per_format` availabilities.
    pub available_inventory: u64,
    pub persona_ratio: f64,
    pub language_filtered: bool,
    /// The summed availability went negative and was clamped to 0
    pub clamped_negative: bool,
    pub per_format: Vec<FormatInventoryBreakdown>,
}

/// Which monthly volumes to read from an inventory record
#[derive(Debug, Clone, PartialEq)]
enum LanguageFilter {
    All,
    Only(Vec<String>),
}

pub struct InventoryAvailabilityCalculator {
    config: InventoryConfig,
}

impl InventoryAvailabilityCalculator {
    pub fn new(config: InventoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Selected personas' national reach over the base population, in (0, 1].
    /// Mass targeting, an empty selection or nothing resolving gives 1.0.
    pub fn persona_ratio(&self, table: &PersonaTable, names: &[String], mass_targeting: bool) -> f64 {
        if mass_targeting || names.is_empty() || self.config.base_population == 0 {
            return 1.0;
        }
        let reach: u64 = names
            .iter()
            .filter_map(|name| table.resolve(name).persona())
            .map(|p| p.size)
            .sum();
        if reach == 0 {
            return 1.0;
        }
        (reach as f64 / self.config.base_population as f64).min(1.0)
    }

    /// Full estimate for a request, including the persona ratio
    pub fn estimate_for_request(
        &self,
        catalogue: &FormatCatalogue,
        inventory: &InventoryTable,
        personas: &PersonaTable,
        request: &InventoryRequest,
    ) -> InventoryEstimate {
        let ratio = self.persona_ratio(personas, &request.personas, request.mass_targeting);
        self.estimate(
            catalogue,
            inventory,
            &request.selected_format_ids,
            &request.target_languages,
            ratio,
        )
    }

    pub fn estimate(
        &self,
        catalogue: &FormatCatalogue,
        inventory: &InventoryTable,
        selected_format_ids: &[String],
        target_languages: &[String],
        persona_ratio: f64,
    ) -> InventoryEstimate {
        let filter = self.language_filter(target_languages);
        let resolver = FormatKeyResolver::new(&self.config, inventory);

        let mut per_format = Vec::with_capacity(selected_format_ids.len());
        let mut total_requests = 0.0;
        let mut total_impressions = 0.0;

        for id in selected_format_ids {
            // Unknown ids are still looked up by name so free-text picks resolve
            let format = catalogue
                .get(id)
                .cloned()
                .unwrap_or_else(|| AdFormat::new(id.clone(), id.clone(), FormatType::Standard));

            let resolution = resolver.resolve(&format);
            if !resolution.is_resolved() {
                per_format.push(FormatInventoryBreakdown {
                    format_id: format.id,
                    format_name: format.name,
                    inventory_keys: Vec::new(),
                    requests: 0,
                    impressions: 0,
                    available_inventory: 0,
                    status: InventoryStatus::NoInventoryData,
                    clamped_negative: false,
                });
                continue;
            }

            let keys = resolution.keys();
            let (requests, impressions) = keys
                .iter()
                .filter_map(|key| inventory.get(key))
                .map(|record| self.monthly_volume(record, &filter))
                .fold((0.0, 0.0), |(r, i), (dr, di)| (r + dr, i + di));

            total_requests += requests;
            total_impressions += impressions;

            let (available, clamped) = self.sellable(requests, impressions, persona_ratio);
            per_format.push(FormatInventoryBreakdown {
                format_id: format.id,
                format_name: format.name,
                inventory_keys: keys,
                requests: requests.round() as u64,
                impressions: impressions.round() as u64,
                available_inventory: available,
                status: InventoryStatus::Available,
                clamped_negative: clamped,
            });
        }

        let (available_inventory, clamped_negative) =
            self.sellable(total_requests, total_impressions, persona_ratio);

        debug!(
            formats = selected_format_ids.len(),
            total_requests,
            total_impressions,
            available_inventory,
            persona_ratio,
            "inventory estimate computed"
        );

        InventoryEstimate {
            total_requests: total_requests.round() as u64,
            total_impressions: total_impressions.round() as u64,
            available_inventory,
            persona_ratio,
            language_filtered: filter != LanguageFilter::All,
            clamped_negative,
            per_format,
        }
    }

    /// `round((requests - impressions) * safety * ratio)`, clamped at zero.
    /// The flag reports whether clamping happened.
    fn sellable(&self, requests: f64, impressions: f64, persona_ratio: f64) -> (u64, bool) {
        let raw = requests - impressions;
        let available = (raw * self.config.safety_factor * persona_ratio).round();
        if available < 0.0 {
            (0, true)
        } else {
            (available as u64, false)
        }
    }

    fn language_filter(&self, selected: &[String]) -> LanguageFilter {
        let selected: Vec<String> = selected
            .iter()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty())
            .collect();
        if selected.is_empty() {
            return LanguageFilter::All;
        }
        let covers_all = self
            .config
            .recognised_languages
            .iter()
            .all(|lang| selected.contains(&lang.to_lowercase()));
        if covers_all {
            LanguageFilter::All
        } else {
            LanguageFilter::Only(selected)
        }
    }

    fn monthly_volume(&self, record: &FormatInventoryRecord, filter: &LanguageFilter) -> (f64, f64) {
        match filter {
            LanguageFilter::All => (record.avg_monthly_requests, record.avg_monthly_impressions),
            LanguageFilter::Only(languages) => {
                let marker = self.config.multi_language_marker.to_lowercase();
                record
                    .by_language
                    .iter()
                    .filter(|row| {
                        let lang = row.language.trim().to_lowercase();
                        lang == marker || languages.contains(&lang)
                    })
                    .fold((0.0, 0.0), |(r, i), row| {
                        (
                            r + row.total_requests / self.config.months_per_year,
                            i + row.total_impressions / self.config.months_per_year,
                        )
                    })
            }
        }
    }
}

impl Default for InventoryAvailabilityCalculator {
    fn default() -> Self {
        Self::new(InventoryConfig::default())
    }
}
