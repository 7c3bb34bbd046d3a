//! Per-vertical plan statistics

use crate::learning::aggregation::unique_keys;
use crate::learning::config::LearningConfig;
use crate::learning::scoring::per_selection;
use crate::models::{FeedbackRecord, RankedKey, VerticalStats};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Default)]
struct VerticalTally {
    total_plans: u32,
    approved_plans: u32,
    total_rating: f64,
    added: HashMap<String, u32>,
    removed: HashMap<String, u32>,
    platforms: HashMap<String, u32>,
}

/// Stats for every vertical key seen in the feedback history.
/// Records without a vertical key are ignored. Top lists count plans, so a
/// name repeated within one record counts once.
pub fn aggregate_verticals(
    records: &[FeedbackRecord],
    config: &LearningConfig,
) -> BTreeMap<String, VerticalStats> {
    let mut tallies: BTreeMap<String, VerticalTally> = BTreeMap::new();

    for record in records {
        let Some(vertical) = record.vertical_key() else {
            continue;
        };
        let tally = tallies.entry(vertical).or_default();
        tally.total_plans += 1;
        if record.approved {
            tally.approved_plans += 1;
        }
        tally.total_rating += record.overall_rating.unwrap_or(config.default_rating);

        bump(&mut tally.added, unique_keys(&record.edits.audiences_added));
        bump(&mut tally.removed, unique_keys(&record.edits.audiences_removed));
        let platforms: BTreeSet<String> = record
            .plan_data
            .line_items
            .iter()
            .filter_map(|item| item.key())
            .collect();
        bump(&mut tally.platforms, platforms);
    }

    tallies
        .into_iter()
        .map(|(key, t)| {
            let stats = VerticalStats {
                total_plans: t.total_plans,
                approved_plans: t.approved_plans,
                total_rating: t.total_rating,
                avg_rating: per_selection(t.total_rating, t.total_plans),
                approval_rate: per_selection(t.approved_plans as f64, t.total_plans),
                top_personas_added: top_ranked(t.added, config.top_list_size),
                top_personas_removed: top_ranked(t.removed, config.top_list_size),
                top_platforms: top_ranked(t.platforms, config.top_list_size),
            };
            (key, stats)
        })
        .collect()
}

fn bump(counts: &mut HashMap<String, u32>, keys: BTreeSet<String>) {
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
}

/// Most frequent keys first; equal counts ordered by key
fn top_ranked(counts: HashMap<String, u32>, limit: usize) -> Vec<RankedKey> {
    let mut ranked: Vec<RankedKey> = counts
        .into_iter()
        .map(|(key, count)| RankedKey { key, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    ranked.truncate(limit);
    ranked
}
