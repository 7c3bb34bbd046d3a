//! Job payloads pushed through the Redis queue

use crate::learning::LearningTrigger;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Run the learning cycle over the full feedback history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnFromFeedbackJob {
    pub run_id: Uuid,
    pub trigger: LearningTrigger,
}

impl LearnFromFeedbackJob {
    pub fn new(trigger: LearningTrigger) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trigger,
        }
    }
}
