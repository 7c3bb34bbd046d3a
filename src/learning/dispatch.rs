//! Hand-off of learning runs from the request path to a background writer

use crate::learning::service::LearningService;
use crate::learning::tracker::RunTracker;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a learning run was started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningTrigger {
    FeedbackSubmitted { plan_id: String },
    Manual,
    Scheduled,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("learning queue is closed")]
    QueueClosed,
    #[error("failed to enqueue learning job: {0}")]
    Backend(String),
}

#[async_trait]
pub trait LearningDispatcher: Send + Sync {
    /// Queue a run and return its id without waiting for it
    async fn dispatch(&self, trigger: LearningTrigger) -> Result<Uuid, DispatchError>;

    fn tracker(&self) -> &RunTracker;
}

/// Single-writer task inside the current process fed by an mpsc channel
pub struct InProcessLearningQueue {
    sender: mpsc::UnboundedSender<Uuid>,
    tracker: RunTracker,
}

impl InProcessLearningQueue {
    /// Spawn the consumer task. Runs execute one at a time in arrival order.
    pub fn start(service: Arc<LearningService>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Uuid>();
        let tracker = service.tracker().clone();

        let handle = tokio::spawn(async move {
            info!("Learning queue consumer started");
            while let Some(run_id) = receiver.recv().await {
                debug!(run_id = %run_id, "Dequeued learning run");
                // Failures are already recorded on the tracker
                let _ = service.run(run_id).await;
            }
            info!("Learning queue consumer stopped");
        });

        (Self { sender, tracker }, handle)
    }
}

#[async_trait]
impl LearningDispatcher for InProcessLearningQueue {
    async fn dispatch(&self, trigger: LearningTrigger) -> Result<Uuid, DispatchError> {
        let run_id = Uuid::new_v4();
        self.tracker.register(run_id, trigger).await;
        if self.sender.send(run_id).is_err() {
            warn!(run_id = %run_id, "Learning queue closed, run dropped");
            return Err(DispatchError::QueueClosed);
        }
        Ok(run_id)
    }

    fn tracker(&self) -> &RunTracker {
        &self.tracker
    }
}
