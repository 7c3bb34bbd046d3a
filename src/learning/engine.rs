//! Feedback learning engine: aggregate, gate, merge

use crate::learning::aggregation::{aggregate_entities, EntityKind};
use crate::learning::config::LearningConfig;
use crate::learning::merge::{merge_weights, WeightsAnalysis};
use crate::learning::scoring::adjustment_multiplier;
use crate::learning::verticals::aggregate_verticals;
use crate::models::{FeedbackRecord, LearningWeights};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Entity counts covered by one analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearningSummary {
    pub personas_learned: usize,
    pub platforms_learned: usize,
    pub formats_learned: usize,
    pub verticals_learned: usize,
}

impl From<&WeightsAnalysis> for LearningSummary {
    fn from(analysis: &WeightsAnalysis) -> Self {
        Self {
            personas_learned: analysis.personas.len(),
            platforms_learned: analysis.platforms.len(),
            formats_learned: analysis.formats.len(),
            verticals_learned: analysis.verticals.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningOutcome {
    /// Merged document, or the stored one untouched when data was insufficient
    pub weights: LearningWeights,
    pub has_sufficient_data: bool,
    pub feedback_count: usize,
    pub summary: LearningSummary,
}

pub struct LearningWeightsEngine {
    config: LearningConfig,
}

impl LearningWeightsEngine {
    pub fn new(config: LearningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    /// Scan the full feedback history once. Never fails: malformed signals
    /// were already dropped at parse time and simply contribute nothing.
    pub fn analyze(&self, records: &[FeedbackRecord]) -> WeightsAnalysis {
        WeightsAnalysis {
            personas: aggregate_entities(records, EntityKind::Persona, &self.config),
            platforms: aggregate_entities(records, EntityKind::Platform, &self.config),
            formats: aggregate_entities(records, EntityKind::Format, &self.config),
            verticals: aggregate_verticals(records, &self.config),
        }
    }

    /// Analyze and merge into `stored`. With fewer than `min_feedback_count`
    /// records `stored` comes back unchanged and nothing should be persisted.
    pub fn analyze_and_merge(
        &self,
        records: &[FeedbackRecord],
        stored: &LearningWeights,
        now: DateTime<Utc>,
    ) -> LearningOutcome {
        let feedback_count = records.len();
        if feedback_count < self.config.min_feedback_count {
            debug!(
                feedback_count = feedback_count,
                min = self.config.min_feedback_count,
                "Not enough feedback to learn from ({} < {})",
                feedback_count,
                self.config.min_feedback_count
            );
            return LearningOutcome {
                weights: stored.clone(),
                has_sufficient_data: false,
                feedback_count,
                summary: LearningSummary::default(),
            };
        }

        let analysis = self.analyze(records);
        let summary = LearningSummary::from(&analysis);
        let weights = merge_weights(stored, analysis, self.config.learning_rate, now);

        LearningOutcome {
            weights,
            has_sufficient_data: true,
            feedback_count,
            summary,
        }
    }

    /// Ranking multiplier for a persona: neutral 1.0 without a stored weight or
    /// below the confidence floor, else `0.5 + normalized_score`
    pub fn score_adjustment(&self, weights: &LearningWeights, persona: &str) -> f64 {
        match weights.persona(persona) {
            Some(score) if score.confidence >= self.config.min_adjustment_confidence => {
                adjustment_multiplier(score.normalized_score)
            }
            _ => 1.0,
        }
    }
}

impl Default for LearningWeightsEngine {
    fn default() -> Self {
        Self::new(LearningConfig::default())
    }
}
