use serde::{Deserialize, Serialize};

/// Thresholds and rates of the feedback learning engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Below this many feedback records a run leaves the weights untouched
    pub min_feedback_count: usize,
    /// Selections at which confidence saturates at 1
    pub high_confidence_count: u32,
    /// Weight of the new analysis when smoothing `normalized_score`
    pub learning_rate: f64,
    pub rating_weight: f64,
    pub approval_weight: f64,
    pub removal_penalty: f64,
    pub addition_bonus: f64,
    pub default_rating: f64,
    pub max_rating: f64,
    /// Adjustments below this confidence stay neutral
    pub min_adjustment_confidence: f64,
    pub top_list_size: usize,
    /// Version-conflict retries of one learning run before giving up
    pub max_conflict_retries: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_feedback_count: 5,
            high_confidence_count: 20,
            learning_rate: 0.3,
            rating_weight: 0.5,
            approval_weight: 0.5,
            removal_penalty: 0.3,
            addition_bonus: 0.5,
            default_rating: 3.0,
            max_rating: 5.0,
            min_adjustment_confidence: 0.3,
            top_list_size: 5,
            max_conflict_retries: 3,
        }
    }
}
