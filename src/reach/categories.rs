//! Persona category resolution and the two category overlap tables.
//!
//! `PairOverlapFactors` discounts reach between two selected personas.
//! `RelevanceOverlapTable` is a finer table used only when scoring sites
//! against a persona selection. The two disagree (same-category Entertainment
//! is 0.60 in one and 0.75 in the other) and existing outputs depend on both,
//! so they are kept apart.

use crate::models::PersonaCategory;
use serde::{Deserialize, Serialize};

/// Ordered category → keyword list. The first category with a keyword
/// contained in the lower-cased persona name wins; no match is `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryKeywords {
    entries: Vec<(PersonaCategory, Vec<String>)>,
}

impl CategoryKeywords {
    pub fn new(entries: Vec<(PersonaCategory, Vec<String>)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(category, words)| {
                (
                    category,
                    words.into_iter().map(|w| w.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, name: &str) -> PersonaCategory {
        let name = name.to_lowercase();
        self.entries
            .iter()
            .find(|(_, words)| words.iter().any(|w| name.contains(w.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(PersonaCategory::Other)
    }
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        let table: [(PersonaCategory, &[&str]); 6] = [
            (
                PersonaCategory::Entertainment,
                &[
                    "comedy", "horror", "movie", "film", "cinema", "drama", "music", "concert",
                    "k-pop", "kpop", "anime", "celebrity", "entertainment", "series",
                ],
            ),
            // Checked before Sports so "esports" does not land there
            (
                PersonaCategory::Technology,
                &[
                    "tech", "gadget", "gaming", "gamer", "esports", "smartphone", "software",
                    "crypto", "digital",
                ],
            ),
            (
                PersonaCategory::Sports,
                &[
                    "sport", "football", "soccer", "badminton", "fitness", "gym", "running",
                    "cycling", "athlete", "outdoor",
                ],
            ),
            (
                PersonaCategory::Lifestyle,
                &[
                    "lifestyle", "fashion", "beauty", "food", "travel", "parent", "mom", "family",
                    "home", "health", "wellness", "cooking",
                ],
            ),
            (
                PersonaCategory::Business,
                &[
                    "business", "entrepreneur", "finance", "investor", "professional",
                    "executive", "property",
                ],
            ),
            (
                PersonaCategory::Luxury,
                &["luxury", "premium", "affluent", "golf", "high net worth", "designer"],
            ),
        ];

        Self::new(
            table
                .iter()
                .map(|(category, words)| {
                    (*category, words.iter().map(|w| w.to_string()).collect())
                })
                .collect(),
        )
    }
}

/// Pair overlap used by the reach discount
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairOverlapFactors {
    pub same_category: f64,
    pub cross_category: f64,
}

impl Default for PairOverlapFactors {
    fn default() -> Self {
        Self {
            same_category: 0.60,
            cross_category: 0.25,
        }
    }
}

impl PairOverlapFactors {
    pub fn factor(&self, a: PersonaCategory, b: PersonaCategory) -> f64 {
        if a == b {
            self.same_category
        } else {
            self.cross_category
        }
    }
}

/// Symmetric category overlap used for site relevance scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceOverlapTable {
    same_category: Vec<(PersonaCategory, f64)>,
    same_category_default: f64,
    cross_category: Vec<(PersonaCategory, PersonaCategory, f64)>,
    cross_category_default: f64,
}

impl Default for RelevanceOverlapTable {
    fn default() -> Self {
        use PersonaCategory::*;
        Self {
            same_category: vec![
                (Entertainment, 0.75),
                (Sports, 0.75),
                (Lifestyle, 0.60),
                (Technology, 0.60),
            ],
            same_category_default: 0.50,
            cross_category: vec![
                (Sports, Lifestyle, 0.55),
                (Business, Luxury, 0.45),
                (Entertainment, Technology, 0.30),
                (Lifestyle, Technology, 0.30),
            ],
            cross_category_default: 0.25,
        }
    }
}

impl RelevanceOverlapTable {
    pub fn factor(&self, a: PersonaCategory, b: PersonaCategory) -> f64 {
        if a == b {
            return self
                .same_category
                .iter()
                .find(|(c, _)| *c == a)
                .map(|(_, f)| *f)
                .unwrap_or(self.same_category_default);
        }
        self.cross_category
            .iter()
            .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
            .map(|(_, _, f)| *f)
            .unwrap_or(self.cross_category_default)
    }
}
