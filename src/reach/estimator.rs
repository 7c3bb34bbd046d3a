//! Unique-reach estimation across a persona selection

use crate::models::{DemographicFilter, GeographyFilter, PersonaCategory};
use crate::reach::config::ReachConfig;
use crate::reach::multipliers::{demographic_multiplier, geography_multiplier};
use crate::reach::resolver::PersonaTable;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Current planner selections relevant to reach
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachRequest {
    #[serde(default, alias = "selectedPersonaNames")]
    pub personas: Vec<String>,
    #[serde(default, alias = "demographicFilters")]
    pub demographics: DemographicFilter,
    #[serde(default, alias = "geographyFilter")]
    pub geography: GeographyFilter,
    #[serde(default)]
    pub mass_targeting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaReach {
    pub name: String,
    pub adjusted_size: u64,
    pub original_size: u64,
    pub category: PersonaCategory,
}

/// Reach projection for one set of selections. Recomputed on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReachEstimate {
    pub personas: Vec<PersonaReach>,
    pub total_raw: u64,
    pub overlap_percent: u8,
    pub estimated_overlap: u64,
    pub unique_reach: u64,
    pub demographic_multiplier: f64,
    pub geography_multiplier: f64,
    pub is_mass_targeting: bool,
    /// Selected names that matched no persona, not even fuzzily
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

pub struct ReachEstimator {
    config: ReachConfig,
}

impl ReachEstimator {
    pub fn new(config: ReachConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReachConfig {
        &self.config
    }

    /// Project unique reach for the request. Never fails: names that do not
    /// resolve contribute nothing and are listed in `unresolved`.
    pub fn estimate(&self, table: &PersonaTable, request: &ReachRequest) -> ReachEstimate {
        let dm = demographic_multiplier(&request.demographics, &self.config.demographic_shares);
        let gm = geography_multiplier(&request.geography, table.sample_state_breakdown());

        if request.mass_targeting {
            return self.mass_estimate(dm, gm);
        }

        let mut personas = Vec::with_capacity(request.personas.len());
        let mut unresolved = Vec::new();
        for name in &request.personas {
            match table.resolve(name).persona() {
                Some(persona) => {
                    let adjusted = (persona.size as f64 * dm * gm).round() as u64;
                    if adjusted > 0 {
                        personas.push(PersonaReach {
                            name: persona.name.clone(),
                            adjusted_size: adjusted,
                            original_size: persona.size,
                            category: persona.category,
                        });
                    }
                }
                None => unresolved.push(name.clone()),
            }
        }

        let total_raw: u64 = personas.iter().map(|p| p.adjusted_size).sum();
        let categories: Vec<PersonaCategory> = personas.iter().map(|p| p.category).collect();
        let avg_factor = self.average_pair_overlap(&categories);

        let estimated_overlap = ((total_raw as f64 * avg_factor).round() as u64).min(total_raw);
        let unique_reach = total_raw - estimated_overlap;

        debug!(
            selected = request.personas.len(),
            resolved = personas.len(),
            unresolved = unresolved.len(),
            total_raw,
            unique_reach,
            "reach estimate computed"
        );

        ReachEstimate {
            personas,
            total_raw,
            overlap_percent: (avg_factor * 100.0).round() as u8,
            estimated_overlap,
            unique_reach,
            demographic_multiplier: dm,
            geography_multiplier: gm,
            is_mass_targeting: false,
            unresolved,
        }
    }

    /// Mean pair overlap factor over every unordered pair; 0 below two personas
    pub fn average_pair_overlap(&self, categories: &[PersonaCategory]) -> f64 {
        if categories.len() < 2 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut pairs = 0usize;
        for (i, a) in categories.iter().enumerate() {
            for b in &categories[i + 1..] {
                sum += self.config.pair_overlap.factor(*a, *b);
                pairs += 1;
            }
        }
        sum / pairs as f64
    }

    fn mass_estimate(&self, dm: f64, gm: f64) -> ReachEstimate {
        let base = &self.config.mass_targeting;
        let total_raw = (base.raw_reach as f64 * dm * gm).round() as u64;
        let unique_reach = ((base.unique_reach as f64 * dm * gm).round() as u64).min(total_raw);
        let estimated_overlap = total_raw - unique_reach;
        let overlap_percent = if total_raw > 0 {
            (estimated_overlap as f64 / total_raw as f64 * 100.0).round() as u8
        } else {
            0
        };

        ReachEstimate {
            personas: Vec::new(),
            total_raw,
            overlap_percent,
            estimated_overlap,
            unique_reach,
            demographic_multiplier: dm,
            geography_multiplier: gm,
            is_mass_targeting: true,
            unresolved: Vec::new(),
        }
    }
}

impl Default for ReachEstimator {
    fn default() -> Self {
        Self::new(ReachConfig::default())
    }
}
