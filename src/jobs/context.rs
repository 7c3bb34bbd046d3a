//! Job context for dependency injection

use crate::learning::LearningService;
use std::sync::Arc;

/// Context passed to job handlers via Apalis Data<T> pattern.
///
/// The learning service owns the store, the run tracker and the metrics
/// handles, so it is all a handler needs.
pub struct JobContext {
    pub learning: Arc<LearningService>,
}

impl JobContext {
    pub fn new(learning: Arc<LearningService>) -> Self {
        Self { learning }
    }
}
