//! Demographic and geographic narrowing factors

use crate::models::{DemographicFilter, GeographyFilter};
use crate::reach::config::DemographicShares;
use std::collections::{BTreeMap, BTreeSet};

/// Product over non-empty dimensions of the summed shares of the selected
/// buckets. Dimensions without a selection contribute 1.
pub fn demographic_multiplier(filter: &DemographicFilter, shares: &DemographicShares) -> f64 {
    dimension_share(&filter.race, &shares.race)
        * dimension_share(&filter.generation, &shares.generation)
        * dimension_share(&filter.income, &shares.income)
}

fn dimension_share<K: Ord>(selected: &BTreeSet<K>, shares: &BTreeMap<K, f64>) -> f64 {
    if selected.is_empty() {
        return 1.0;
    }
    selected
        .iter()
        .map(|bucket| shares.get(bucket).copied().unwrap_or(0.0))
        .sum()
}

/// Share of the national audience living in the selected states.
///
/// Nationwide selections, a missing breakdown, or a selection covering every
/// state all yield 1.0. State names compare case-insensitively.
pub fn geography_multiplier(
    filter: &GeographyFilter,
    breakdown: Option<&BTreeMap<String, u64>>,
) -> f64 {
    if filter.is_nationwide() {
        return 1.0;
    }
    let Some(breakdown) = breakdown else {
        return 1.0;
    };

    let national: u64 = breakdown.values().sum();
    if national == 0 {
        return 1.0;
    }

    let selected: BTreeSet<String> = filter
        .selected_states
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect();

    let covers_all = breakdown
        .keys()
        .all(|state| selected.contains(&state.to_lowercase()));
    if covers_all {
        return 1.0;
    }

    let in_selection: u64 = breakdown
        .iter()
        .filter(|(state, _)| selected.contains(&state.to_lowercase()))
        .map(|(_, audience)| *audience)
        .sum();

    in_selection as f64 / national as f64
}
