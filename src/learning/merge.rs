//! Merge a fresh analysis into the stored weights document

use crate::learning::scoring::{clamp_unit, smooth};
use crate::models::{EntityScore, LearningWeights, VerticalStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Result of scanning the full feedback history once
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightsAnalysis {
    pub personas: BTreeMap<String, EntityScore>,
    pub platforms: BTreeMap<String, EntityScore>,
    pub formats: BTreeMap<String, EntityScore>,
    pub verticals: BTreeMap<String, VerticalStats>,
}

/// Smooth `normalized_score` of known entities, overwrite their other fields,
/// insert new entities as-is and replace verticals wholesale.
pub fn merge_weights(
    stored: &LearningWeights,
    analysis: WeightsAnalysis,
    learning_rate: f64,
    now: DateTime<Utc>,
) -> LearningWeights {
    LearningWeights {
        personas: merge_entities(&stored.personas, analysis.personas, learning_rate),
        platforms: merge_entities(&stored.platforms, analysis.platforms, learning_rate),
        formats: merge_entities(&stored.formats, analysis.formats, learning_rate),
        verticals: analysis.verticals,
        last_updated: Some(now),
    }
}

fn merge_entities(
    stored: &BTreeMap<String, EntityScore>,
    fresh: BTreeMap<String, EntityScore>,
    learning_rate: f64,
) -> BTreeMap<String, EntityScore> {
    let mut merged = stored.clone();
    for (key, mut score) in fresh {
        if let Some(previous) = stored.get(&key) {
            score.normalized_score = clamp_unit(smooth(
                previous.normalized_score,
                score.normalized_score,
                learning_rate,
            ));
        }
        merged.insert(key, score);
    }
    merged
}
