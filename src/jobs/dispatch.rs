//! Redis-backed learning dispatcher; runs are consumed by the worker binary

use crate::jobs::types::LearnFromFeedbackJob;
use crate::learning::{DispatchError, LearningDispatcher, LearningTrigger, RunTracker};
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

pub struct RedisLearningDispatcher {
    storage: RedisStorage<LearnFromFeedbackJob>,
    tracker: RunTracker,
}

impl RedisLearningDispatcher {
    pub fn new(storage: RedisStorage<LearnFromFeedbackJob>, tracker: RunTracker) -> Self {
        Self { storage, tracker }
    }

    pub async fn connect(redis_url: &str, tracker: RunTracker) -> Result<Self, DispatchError> {
        let conn = apalis_redis::connect(redis_url.to_string())
            .await
            .map_err(|e| DispatchError::Backend(e.to_string()))?;
        Ok(Self::new(RedisStorage::new(conn), tracker))
    }
}

#[async_trait]
impl LearningDispatcher for RedisLearningDispatcher {
    /// The run is tracked here as `Queued`. The worker that executes it
    /// writes the final state to the shared learning store, where the run
    /// endpoint picks it up.
    async fn dispatch(&self, trigger: LearningTrigger) -> Result<Uuid, DispatchError> {
        let job = LearnFromFeedbackJob::new(trigger.clone());
        let run_id = job.run_id;
        self.tracker.register(run_id, trigger).await;

        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| DispatchError::Backend(e.to_string()))?;

        debug!(run_id = %run_id, "Enqueued LearnFromFeedbackJob");
        Ok(run_id)
    }

    fn tracker(&self) -> &RunTracker {
        &self.tracker
    }
}
