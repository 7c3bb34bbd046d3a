//! Serialized read-analyze-merge-write learning runs

use crate::learning::dispatch::LearningTrigger;
use crate::learning::engine::{LearningSummary, LearningWeightsEngine};
use crate::learning::tracker::{RunStatus, RunTracker};
use crate::metrics::Metrics;
use crate::models::FeedbackRecord;
use crate::store::{LearningStore, StoreError, VersionedWeights};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LearningError {
    #[error("invalid feedback: {0}")]
    InvalidFeedback(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("weights kept changing underneath the run after {0} attempts")]
    ConflictRetriesExhausted(usize),
}

/// What a finished run did
#[derive(Debug, Clone, Serialize)]
pub struct LearningRunReport {
    pub run_id: Uuid,
    pub has_sufficient_data: bool,
    pub feedback_count: usize,
    pub persisted: bool,
    pub version: u64,
    pub summary: LearningSummary,
}

pub struct LearningService {
    engine: LearningWeightsEngine,
    store: Arc<dyn LearningStore>,
    tracker: RunTracker,
    metrics: Option<Arc<Metrics>>,
    // One writer per process; cross-process races fall back to the version check
    run_lock: Mutex<()>,
}

impl LearningService {
    pub fn new(
        engine: LearningWeightsEngine,
        store: Arc<dyn LearningStore>,
        tracker: RunTracker,
    ) -> Self {
        Self {
            engine,
            store,
            tracker,
            metrics: None,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn engine(&self) -> &LearningWeightsEngine {
        &self.engine
    }

    pub fn store(&self) -> &Arc<dyn LearningStore> {
        &self.store
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub async fn current_weights(&self) -> Result<VersionedWeights, LearningError> {
        Ok(self.store.load_weights().await?)
    }

    /// Validate and persist one feedback record. Fills in a missing id and
    /// returns the stored record.
    pub async fn submit_feedback(
        &self,
        mut record: FeedbackRecord,
    ) -> Result<FeedbackRecord, LearningError> {
        if record.plan_id.trim().is_empty() {
            return Err(LearningError::InvalidFeedback(
                "plan_id is required".to_string(),
            ));
        }
        if record.id.trim().is_empty() {
            record.id = Uuid::new_v4().to_string();
        }
        // Missing or unreadable timestamps parse as the epoch
        if record.timestamp == DateTime::<Utc>::default() {
            record.timestamp = Utc::now();
        }

        self.store.append_feedback(&record).await?;
        if let Some(ref metrics) = self.metrics {
            metrics.feedback_submissions_total.inc();
        }
        info!(
            feedback_id = %record.id,
            plan_id = %record.plan_id,
            approved = record.approved,
            "Feedback stored"
        );
        Ok(record)
    }

    /// Register and execute a run immediately (manual trigger)
    pub async fn analyze_now(
        &self,
        trigger: LearningTrigger,
    ) -> Result<LearningRunReport, LearningError> {
        let run_id = Uuid::new_v4();
        self.tracker.register(run_id, trigger).await;
        self.run(run_id).await
    }

    /// Execute a previously registered run and record its terminal status
    pub async fn run(&self, run_id: Uuid) -> Result<LearningRunReport, LearningError> {
        let _guard = self.run_lock.lock().await;
        let started = Instant::now();
        if let Some(ref metrics) = self.metrics {
            metrics.learning_runs_active.inc();
        }

        let result = self.execute(run_id).await;

        let outcome = match &result {
            Ok(report) if report.persisted => {
                self.tracker
                    .set_status(run_id, RunStatus::Persisted { version: report.version })
                    .await;
                "persisted"
            }
            Ok(_) => {
                self.tracker.set_status(run_id, RunStatus::Skipped).await;
                "skipped"
            }
            Err(e) => {
                error!(run_id = %run_id, error = %e, "Learning run failed");
                self.tracker
                    .set_status(
                        run_id,
                        RunStatus::Failed {
                            reason: e.to_string(),
                        },
                    )
                    .await;
                "failed"
            }
        };

        self.persist_run_record(run_id).await;

        if let Some(ref metrics) = self.metrics {
            metrics.learning_runs_active.dec();
            metrics.record_learning_outcome(outcome);
            metrics
                .learning_run_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }

        result
    }

    /// Copy the terminal record to the store so processes that did not run
    /// it (the API, with a separate worker) can still report the outcome
    async fn persist_run_record(&self, run_id: Uuid) {
        let Some(record) = self.tracker.get(run_id).await else {
            return;
        };
        if let Err(e) = self.store.record_run(&record).await {
            warn!(run_id = %run_id, error = %e, "Failed to store learning run status");
        }
    }

    async fn execute(&self, run_id: Uuid) -> Result<LearningRunReport, LearningError> {
        let max_attempts = self.engine.config().max_conflict_retries + 1;

        for attempt in 1..=max_attempts {
            self.tracker.set_status(run_id, RunStatus::Analyzing).await;
            let records = self.store.list_feedback().await?;
            let stored = self.store.load_weights().await?;

            let outcome = self
                .engine
                .analyze_and_merge(&records, &stored.weights, Utc::now());

            if !outcome.has_sufficient_data {
                info!(
                    run_id = %run_id,
                    feedback_count = outcome.feedback_count,
                    "Learning run skipped: insufficient feedback"
                );
                return Ok(LearningRunReport {
                    run_id,
                    has_sufficient_data: false,
                    feedback_count: outcome.feedback_count,
                    persisted: false,
                    version: stored.version,
                    summary: outcome.summary,
                });
            }

            self.tracker.set_status(run_id, RunStatus::Merging).await;
            match self.store.save_weights(&outcome.weights, stored.version).await {
                Ok(version) => {
                    info!(
                        run_id = %run_id,
                        version = version,
                        feedback_count = outcome.feedback_count,
                        personas = outcome.summary.personas_learned,
                        platforms = outcome.summary.platforms_learned,
                        formats = outcome.summary.formats_learned,
                        verticals = outcome.summary.verticals_learned,
                        "Learning weights persisted"
                    );
                    return Ok(LearningRunReport {
                        run_id,
                        has_sufficient_data: true,
                        feedback_count: outcome.feedback_count,
                        persisted: true,
                        version,
                        summary: outcome.summary,
                    });
                }
                Err(StoreError::VersionConflict { expected, found }) => {
                    warn!(
                        run_id = %run_id,
                        attempt = attempt,
                        expected = expected,
                        found = found,
                        "Weights changed during run, re-analyzing"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(run_id = %run_id, attempts = max_attempts, "Giving up on conflicting run");
        Err(LearningError::ConflictRetriesExhausted(max_attempts))
    }
}
