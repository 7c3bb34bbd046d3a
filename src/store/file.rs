//! JSON-on-disk store: `feedback.json` (array), `learning_weights.json` and
//! `learning_runs.json` (most recent finished runs)

use crate::learning::RunRecord;
use crate::models::{FeedbackRecord, LearningWeights};
use crate::store::{LearningStore, StoreError, VersionedWeights};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

pub const FEEDBACK_FILE: &str = "feedback.json";
pub const WEIGHTS_FILE: &str = "learning_weights.json";
pub const RUNS_FILE: &str = "learning_runs.json";

/// Finished runs kept on disk; older ones are dropped first
const MAX_STORED_RUNS: usize = 1024;

#[derive(Serialize, Deserialize, Default)]
struct WeightsFile {
    #[serde(default)]
    version: u64,
    #[serde(flatten)]
    weights: LearningWeights,
}

pub struct FileStore {
    dir: PathBuf,
    // Serializes read-modify-write cycles on both files
    lock: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "File store opened");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn feedback_path(&self) -> PathBuf {
        self.dir.join(FEEDBACK_FILE)
    }

    fn weights_path(&self) -> PathBuf {
        self.dir.join(WEIGHTS_FILE)
    }

    fn runs_path(&self) -> PathBuf {
        self.dir.join(RUNS_FILE)
    }

    async fn read_runs(&self) -> Result<Vec<RunRecord>, StoreError> {
        match read_optional(&self.runs_path()).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn read_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let Some(bytes) = read_optional(&self.feedback_path()).await? else {
            return Ok(Vec::new());
        };
        let values: Vec<Value> = serde_json::from_slice(&bytes)?;
        let total = values.len();
        let records: Vec<FeedbackRecord> = values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();
        if records.len() < total {
            warn!(
                skipped = total - records.len(),
                "Skipped unreadable entries in {}",
                FEEDBACK_FILE
            );
        }
        Ok(records)
    }

    async fn read_weights(&self) -> Result<WeightsFile, StoreError> {
        match read_optional(&self.weights_path()).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(WeightsFile::default()),
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl LearningStore for FileStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_feedback().await?;
        if !record.id.is_empty() && records.iter().any(|r| r.id == record.id) {
            debug!(feedback_id = %record.id, "Feedback already stored");
            return Ok(());
        }
        records.push(record.clone());
        write_atomic(&self.feedback_path(), &records).await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_feedback().await
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        let _guard = self.lock.lock().await;
        let file = self.read_weights().await?;
        Ok(VersionedWeights {
            version: file.version,
            weights: file.weights,
        })
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let current = self.read_weights().await?;
        if current.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                found: current.version,
            });
        }
        let next = WeightsFile {
            version: expected_version + 1,
            weights: weights.clone(),
        };
        write_atomic(&self.weights_path(), &next).await?;
        Ok(next.version)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut runs = self.read_runs().await?;
        runs.retain(|r| r.run_id != run.run_id);
        runs.push(run.clone());
        if runs.len() > MAX_STORED_RUNS {
            let excess = runs.len() - MAX_STORED_RUNS;
            runs.drain(..excess);
        }
        write_atomic(&self.runs_path(), &runs).await
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let runs = self.read_runs().await?;
        Ok(runs.into_iter().find(|r| r.run_id == run_id))
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
