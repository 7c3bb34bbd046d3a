//! Site relevance ranking against a persona selection

use crate::models::{PersonaCategory, Site};
use crate::reach::categories::RelevanceOverlapTable;
use crate::reach::resolver::PersonaTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRelevance {
    pub name: String,
    pub category: PersonaCategory,
    pub monthly_impressions: u64,
    pub relevance: f64,
}

/// Score every site by the mean relevance factor between its category and
/// each resolved persona's category, highest first (ties by name).
pub fn rank_sites(
    table: &PersonaTable,
    sites: &[Site],
    persona_names: &[String],
    overlap: &RelevanceOverlapTable,
) -> Vec<SiteRelevance> {
    let categories: Vec<PersonaCategory> = persona_names
        .iter()
        .filter_map(|name| table.resolve(name).persona())
        .map(|p| p.category)
        .collect();

    let mut ranked: Vec<SiteRelevance> = sites
        .iter()
        .map(|site| {
            let relevance = if categories.is_empty() {
                0.0
            } else {
                categories
                    .iter()
                    .map(|c| overlap.factor(*c, site.category))
                    .sum::<f64>()
                    / categories.len() as f64
            };
            SiteRelevance {
                name: site.name.clone(),
                category: site.category,
                monthly_impressions: site.monthly_impressions,
                relevance,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranked
}
