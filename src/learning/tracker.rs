//! Observable status of learning runs

use crate::learning::dispatch::LearningTrigger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Analyzing,
    Merging,
    Persisted { version: u64 },
    /// Not enough feedback yet; nothing was written
    Skipped,
    Failed { reason: String },
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Persisted { .. } | RunStatus::Skipped | RunStatus::Failed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub trigger: LearningTrigger,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct TrackerInner {
    runs: HashMap<Uuid, RunRecord>,
    order: VecDeque<Uuid>,
}

/// Bounded in-memory run registry; the oldest runs are evicted first
#[derive(Clone)]
pub struct RunTracker {
    inner: Arc<RwLock<TrackerInner>>,
    capacity: usize,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TrackerInner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Register a new run in `Queued`
    pub async fn register(&self, run_id: Uuid, trigger: LearningTrigger) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        if inner.runs.contains_key(&run_id) {
            return;
        }
        while inner.order.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.runs.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(run_id);
        inner.runs.insert(
            run_id,
            RunRecord {
                run_id,
                trigger,
                status: RunStatus::Queued,
                created_at: now,
                updated_at: now,
            },
        );
    }

    /// Move a run to `status`. Unknown ids are ignored.
    pub async fn set_status(&self, run_id: Uuid, status: RunStatus) {
        let mut inner = self.inner.write().await;
        if let Some(record) = inner.runs.get_mut(&run_id) {
            record.status = status;
            record.updated_at = Utc::now();
        }
    }

    pub async fn get(&self, run_id: Uuid) -> Option<RunRecord> {
        self.inner.read().await.runs.get(&run_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.runs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}
