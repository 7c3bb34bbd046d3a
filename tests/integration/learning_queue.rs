//! Integration tests for background learning runs
//!
//! Runs go through the in-process queue against an in-memory store; a
//! wrapper store simulates a second writer racing for the weights document.

use async_trait::async_trait;
use reachplan::learning::{
    InProcessLearningQueue, LearningDispatcher, LearningError, LearningService, LearningTrigger,
    LearningWeightsEngine, RunRecord, RunStatus, RunTracker,
};
use reachplan::models::{AudienceSelection, EntityScore, FeedbackRecord, LearningWeights};
use reachplan::store::{
    LearningStore, MemoryStore, RetryingStore, StoreConfig, StoreError, VersionedWeights,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn history(count: usize) -> Vec<FeedbackRecord> {
    (0..count)
        .map(|i| {
            let mut record = FeedbackRecord::new(format!("plan-{}", i));
            record.id = format!("fb-{}", i);
            record.overall_rating = Some(4.0);
            record.approved = i % 2 == 0;
            record.plan_data.audiences = vec![AudienceSelection::persona("Comedy Lover")];
            record
        })
        .collect()
}

fn service(store: Arc<dyn LearningStore>) -> Arc<LearningService> {
    Arc::new(LearningService::new(
        LearningWeightsEngine::default(),
        store,
        RunTracker::new(),
    ))
}

async fn wait_terminal(tracker: &RunTracker, run_id: Uuid) -> RunRecord {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(record) = tracker.get(run_id).await {
                if record.status.is_terminal() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("run finished in time")
}

/// Another writer sneaks in a save before the first `conflicts` saves
struct RacingStore {
    inner: MemoryStore,
    conflicts: usize,
    saves: AtomicUsize,
}

impl RacingStore {
    fn new(records: Vec<FeedbackRecord>, conflicts: usize) -> Self {
        Self {
            inner: MemoryStore::with_feedback(records),
            conflicts,
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LearningStore for RacingStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        self.inner.append_feedback(record).await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.inner.list_feedback().await
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        self.inner.load_weights().await
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        if self.saves.fetch_add(1, Ordering::SeqCst) < self.conflicts {
            let current = self.inner.load_weights().await?;
            self.inner
                .save_weights(&LearningWeights::default(), current.version)
                .await?;
        }
        self.inner.save_weights(weights, expected_version).await
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        self.inner.record_run(run).await
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        self.inner.load_run(run_id).await
    }

    fn backend_name(&self) -> &'static str {
        "racing"
    }
}

#[tokio::test]
async fn queued_run_persists_weights() {
    let store = Arc::new(MemoryStore::with_feedback(history(6)));
    let learning = service(store.clone());
    let (queue, _handle) = InProcessLearningQueue::start(learning.clone());

    let run_id = queue.dispatch(LearningTrigger::Manual).await.unwrap();
    let record = wait_terminal(queue.tracker(), run_id).await;

    assert_eq!(record.status, RunStatus::Persisted { version: 1 });
    let stored = store.load_weights().await.unwrap();
    assert_eq!(stored.version, 1);
    assert_eq!(stored.weights.personas["comedy lover"].selection_count, 6);
}

#[tokio::test]
async fn insufficient_history_skips_without_writing() {
    let store = Arc::new(MemoryStore::with_feedback(history(4)));
    let learning = service(store.clone());
    let (queue, _handle) = InProcessLearningQueue::start(learning);

    let run_id = queue
        .dispatch(LearningTrigger::FeedbackSubmitted {
            plan_id: "plan-3".to_string(),
        })
        .await
        .unwrap();
    let record = wait_terminal(queue.tracker(), run_id).await;

    assert_eq!(record.status, RunStatus::Skipped);
    assert_eq!(store.load_weights().await.unwrap().version, 0);
}

#[tokio::test]
async fn concurrent_dispatches_run_one_at_a_time() {
    let store = Arc::new(MemoryStore::with_feedback(history(5)));
    let learning = service(store.clone());
    let (queue, _handle) = InProcessLearningQueue::start(learning);
    let queue = Arc::new(queue);

    let dispatches = (0..4).map(|_| {
        let queue = queue.clone();
        tokio::spawn(async move { queue.dispatch(LearningTrigger::Scheduled).await })
    });
    let mut run_ids = Vec::new();
    for handle in dispatches {
        run_ids.push(handle.await.unwrap().unwrap());
    }

    let mut versions = Vec::new();
    for run_id in run_ids {
        match wait_terminal(queue.tracker(), run_id).await.status {
            RunStatus::Persisted { version } => versions.push(version),
            other => panic!("unexpected status {:?}", other),
        }
    }
    versions.sort_unstable();

    assert_eq!(versions, vec![1, 2, 3, 4]);
    assert_eq!(store.load_weights().await.unwrap().version, 4);
}

#[tokio::test]
async fn conflicting_writer_triggers_reanalysis() {
    let store = Arc::new(RacingStore::new(history(5), 1));
    let learning = service(store.clone());

    let report = learning.analyze_now(LearningTrigger::Manual).await.unwrap();

    assert!(report.persisted);
    // The racing writer took version 1
    assert_eq!(report.version, 2);
    assert_eq!(store.saves.load(Ordering::SeqCst), 2);
    let stored = store.load_weights().await.unwrap();
    assert!(stored.weights.personas.contains_key("comedy lover"));
}

#[tokio::test]
async fn endless_conflicts_fail_the_run() {
    let store = Arc::new(RacingStore::new(history(5), usize::MAX));
    let learning = service(store);

    let run_id = Uuid::new_v4();
    learning
        .tracker()
        .register(run_id, LearningTrigger::Manual)
        .await;
    let err = learning.run(run_id).await.unwrap_err();

    assert!(matches!(err, LearningError::ConflictRetriesExhausted(4)));
    let record = learning.tracker().get(run_id).await.unwrap();
    assert!(matches!(record.status, RunStatus::Failed { .. }));
}

#[tokio::test]
async fn submitted_feedback_gets_id_and_timestamp() {
    let store = Arc::new(MemoryStore::new());
    let learning = service(store.clone());

    let record: FeedbackRecord =
        serde_json::from_value(serde_json::json!({ "plan_id": "plan-x" })).unwrap();
    let stored = learning.submit_feedback(record).await.unwrap();

    assert!(!stored.id.is_empty());
    assert!(stored.timestamp.timestamp() > 0);
    assert_eq!(store.list_feedback().await.unwrap(), vec![stored]);
}

/// The first weights save commits, then its acknowledgement stalls past the
/// caller's timeout
struct StallingStore {
    inner: MemoryStore,
    stall: Duration,
    stalled: AtomicUsize,
}

#[async_trait]
impl LearningStore for StallingStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        self.inner.append_feedback(record).await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.inner.list_feedback().await
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        self.inner.load_weights().await
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let version = self.inner.save_weights(weights, expected_version).await?;
        if self.stalled.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.stall).await;
        }
        Ok(version)
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        self.inner.record_run(run).await
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        self.inner.load_run(run_id).await
    }

    fn backend_name(&self) -> &'static str {
        "stalling"
    }
}

#[tokio::test]
async fn timed_out_save_is_smoothed_exactly_once() {
    let records: Vec<FeedbackRecord> = (0..5)
        .map(|i| {
            let mut record = FeedbackRecord::new(format!("plan-{}", i));
            record.id = format!("fb-{}", i);
            record.overall_rating = Some(5.0);
            record.approved = true;
            record.plan_data.audiences = vec![AudienceSelection::persona("X")];
            record
        })
        .collect();
    let inner = MemoryStore::with_feedback(records);
    let mut seeded = LearningWeights::default();
    seeded.personas.insert(
        "x".to_string(),
        EntityScore {
            normalized_score: 0.2,
            ..EntityScore::default()
        },
    );
    inner.save_weights(&seeded, 0).await.unwrap();

    let stalling = Arc::new(StallingStore {
        inner,
        stall: Duration::from_millis(200),
        stalled: AtomicUsize::new(0),
    });
    let store: Arc<dyn LearningStore> = Arc::new(RetryingStore::new(
        stalling.clone(),
        StoreConfig {
            call_timeout: Duration::from_millis(50),
            max_retries: 3,
            min_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        },
    ));
    let learning = service(store.clone());

    let report = learning.analyze_now(LearningTrigger::Manual).await.unwrap();

    assert!(report.persisted);
    assert_eq!(report.version, 2);
    let stored = store.load_weights().await.unwrap();
    assert_eq!(stored.version, 2);
    // 0.2 * 0.7 + 1.0 * 0.3
    assert!((stored.weights.personas["x"].normalized_score - 0.44).abs() < 1e-9);
}

#[tokio::test]
async fn finished_runs_are_readable_from_the_store() {
    let store = Arc::new(MemoryStore::with_feedback(history(6)));
    let learning = service(store.clone());

    let report = learning.analyze_now(LearningTrigger::Manual).await.unwrap();

    let stored = store.load_run(report.run_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RunStatus::Persisted { version: 1 });
    assert_eq!(stored.trigger, LearningTrigger::Manual);
}
