//! Apalis worker setup for learning jobs

use crate::jobs::context::JobContext;
use crate::jobs::handlers;
use crate::jobs::types::LearnFromFeedbackJob;
use apalis::prelude::*;
use apalis_redis::RedisStorage;
use std::sync::Arc;
use tracing::info;

/// Configuration for the job runtime
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Scheduled learning interval (0 = only feedback-triggered runs)
    pub learning_interval_seconds: u64,
    pub worker_name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            learning_interval_seconds: 0,
            worker_name: "learning-worker".to_string(),
        }
    }
}

/// Learning runtime that sets up the Apalis worker.
///
/// Runs are serialized by the learning service, so one worker is enough.
pub struct LearningRuntime {
    config: RuntimeConfig,
    job_context: Arc<JobContext>,
    storage: RedisStorage<LearnFromFeedbackJob>,
}

impl LearningRuntime {
    pub fn new(
        config: RuntimeConfig,
        job_context: Arc<JobContext>,
        storage: RedisStorage<LearnFromFeedbackJob>,
    ) -> Self {
        Self {
            config,
            job_context,
            storage,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Start the worker and return its handle for graceful shutdown
    pub fn start_worker(&self) -> tokio::task::JoinHandle<()> {
        let storage = self.storage.clone();
        let job_context = self.job_context.clone();
        let name = self.config.worker_name.clone();

        tokio::spawn(async move {
            let worker = WorkerBuilder::new(name.as_str())
                .data(job_context)
                .backend(storage)
                .build_fn(handlers::handle_learning_run);

            info!(worker = %name, "LearningRuntime: LearnFromFeedbackJob worker started");
            worker.run().await;
        })
    }
}
