//! Per-entity aggregation of feedback records

use crate::learning::config::LearningConfig;
use crate::learning::scoring::{clamp_unit, confidence, per_selection, success_increment};
use crate::models::{normalize_key, EntityScore, FeedbackRecord, RatingDimension};
use std::collections::{BTreeMap, BTreeSet};

/// Which plan sub-array an aggregation scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Persona,
    Platform,
    Format,
}

impl EntityKind {
    fn dimension(&self) -> RatingDimension {
        match self {
            EntityKind::Persona => RatingDimension::Audience,
            EntityKind::Platform => RatingDimension::Platform,
            EntityKind::Format => RatingDimension::Format,
        }
    }

    fn keys(&self, record: &FeedbackRecord) -> Vec<String> {
        match self {
            EntityKind::Persona => record
                .plan_data
                .audiences
                .iter()
                .filter_map(|a| a.key())
                .collect(),
            EntityKind::Platform => record
                .plan_data
                .line_items
                .iter()
                .filter_map(|l| l.key())
                .collect(),
            EntityKind::Format => record
                .plan_data
                .formats
                .iter()
                .filter_map(|f| f.key())
                .collect(),
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    success: f64,
    selections: u32,
    edits: u32,
    total_rating: f64,
    removals: u32,
}

impl Accumulator {
    fn finish(self, config: &LearningConfig) -> EntityScore {
        let success_score = per_selection(self.success, self.selections);
        EntityScore {
            success_score,
            selection_count: self.selections,
            edit_count: self.edits,
            total_rating: self.total_rating,
            avg_rating: per_selection(self.total_rating, self.selections),
            removal_count: self.removals,
            removal_rate: per_selection(self.removals as f64, self.selections),
            confidence: confidence(self.selections, config.high_confidence_count),
            normalized_score: clamp_unit(success_score),
        }
    }
}

/// Aggregate every record mentioning an entity of `kind` into one score per key.
///
/// Personas also take the edit signals: a removal costs `removal_penalty`, an
/// addition adds `addition_bonus` even when the persona was never selected.
pub fn aggregate_entities(
    records: &[FeedbackRecord],
    kind: EntityKind,
    config: &LearningConfig,
) -> BTreeMap<String, EntityScore> {
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for record in records {
        let rating = record.rating_for(kind.dimension(), config.default_rating);
        let increment = success_increment(
            rating,
            config.max_rating,
            record.approved,
            config.rating_weight,
            config.approval_weight,
        );

        for key in kind.keys(record) {
            let entry = accumulators.entry(key).or_default();
            entry.selections += 1;
            entry.total_rating += rating;
            entry.success += increment;
        }

        if kind == EntityKind::Persona {
            for key in unique_keys(&record.edits.audiences_removed) {
                let entry = accumulators.entry(key).or_default();
                entry.removals += 1;
                entry.success -= config.removal_penalty;
            }
            for key in unique_keys(&record.edits.audiences_added) {
                let entry = accumulators.entry(key).or_default();
                entry.edits += 1;
                entry.success += config.addition_bonus;
            }
        }
    }

    accumulators
        .into_iter()
        .map(|(key, acc)| (key, acc.finish(config)))
        .collect()
}

pub(crate) fn unique_keys(names: &[String]) -> BTreeSet<String> {
    names
        .iter()
        .map(|n| normalize_key(n))
        .filter(|k| !k.is_empty())
        .collect()
}
