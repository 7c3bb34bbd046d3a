use crate::learning::RunRecord;
use crate::models::{FeedbackRecord, LearningWeights};
use crate::store::{LearningStore, StoreError, VersionedWeights};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store for tests and single-instance development
#[derive(Default)]
pub struct MemoryStore {
    feedback: RwLock<Vec<FeedbackRecord>>,
    weights: RwLock<VersionedWeights>,
    runs: RwLock<HashMap<Uuid, RunRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing history
    pub fn with_feedback(records: Vec<FeedbackRecord>) -> Self {
        Self {
            feedback: RwLock::new(records),
            weights: RwLock::new(VersionedWeights::default()),
            runs: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let mut feedback = self.feedback.write().await;
        if !record.id.is_empty() && feedback.iter().any(|r| r.id == record.id) {
            return Ok(());
        }
        feedback.push(record.clone());
        Ok(())
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        Ok(self.feedback.read().await.clone())
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        Ok(self.weights.read().await.clone())
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut current = self.weights.write().await;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: current.version,
            });
        }
        current.version += 1;
        current.weights = weights.clone();
        Ok(current.version)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        self.runs.write().await.insert(run.run_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        Ok(self.runs.read().await.get(&run_id).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
