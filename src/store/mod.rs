//! Persistence port for feedback records, the learning weights document and
//! finished learning runs

pub mod error;
pub mod file;
pub mod memory;
pub mod retry;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use retry::{RetryingStore, StoreConfig};

use crate::learning::RunRecord;
use crate::models::{FeedbackRecord, LearningWeights};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

/// The weights document with its optimistic-concurrency version.
/// A store that was never written holds empty weights at version 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionedWeights {
    pub version: u64,
    pub weights: LearningWeights,
}

#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Append one feedback record; records are never updated afterwards.
    /// Appending an id that is already stored is a no-op, so a replayed
    /// write cannot count the same submission twice.
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError>;

    /// Full feedback history in insertion order
    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError>;

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError>;

    /// Replace the weights document if the stored version still equals
    /// `expected_version`. Returns the new version or `VersionConflict`.
    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError>;

    /// Keep the final state of a run so any process sharing the store can
    /// report it. Writing the same run id again replaces the record.
    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError>;

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError>;

    fn backend_name(&self) -> &'static str;
}
