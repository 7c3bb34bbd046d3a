//! Timeout and backoff decorator around any `LearningStore`

use crate::learning::RunRecord;
use crate::models::{FeedbackRecord, LearningWeights};
use crate::store::{LearningStore, StoreError, VersionedWeights};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub call_timeout: Duration,
    pub max_retries: usize,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(3),
            max_retries: 3,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Every call gets `call_timeout`; transient failures are retried with
/// exponential backoff, then surfaced.
///
/// A timed-out write may still have committed. Feedback appends are keyed by
/// id so replaying them is harmless. A weights save that was replayed after
/// its own commit shows up as a conflict one version ahead holding the same
/// document; that is reported as the success it was. Any other conflict
/// passes straight through.
pub struct RetryingStore {
    inner: Arc<dyn LearningStore>,
    config: StoreConfig,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn LearningStore>, config: StoreConfig) -> Self {
        Self { inner, config }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.min_backoff)
            .with_max_delay(self.config.max_backoff)
            .with_max_times(self.config.max_retries)
            .with_jitter()
    }

    async fn call<T, F, Fut>(&self, operation: &'static str, mut f: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, StoreError>> + Send,
        T: Send,
    {
        let timeout = self.config.call_timeout;
        let backend = self.inner.backend_name();
        let attempt = || {
            let fut = f();
            async move {
                tokio::time::timeout(timeout, fut)
                    .await
                    .unwrap_or(Err(StoreError::Timeout(timeout)))
            }
        };

        attempt
            .retry(self.backoff())
            .when(|e: &StoreError| e.is_transient())
            .notify(|e: &StoreError, delay: Duration| {
                warn!(
                    backend = backend,
                    operation = operation,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Store call failed, retrying in {:?}",
                    delay
                );
            })
            .await
    }
}

#[async_trait]
impl LearningStore for RetryingStore {
    async fn append_feedback(&self, record: &FeedbackRecord) -> Result<(), StoreError> {
        self.call("append_feedback", || self.inner.append_feedback(record))
            .await
    }

    async fn list_feedback(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.call("list_feedback", || self.inner.list_feedback())
            .await
    }

    async fn load_weights(&self) -> Result<VersionedWeights, StoreError> {
        self.call("load_weights", || self.inner.load_weights()).await
    }

    async fn save_weights(
        &self,
        weights: &LearningWeights,
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let attempts = AtomicUsize::new(0);
        let result = self
            .call("save_weights", || {
                attempts.fetch_add(1, Ordering::Relaxed);
                self.inner.save_weights(weights, expected_version)
            })
            .await;

        match result {
            Err(StoreError::VersionConflict { expected, found })
                if attempts.load(Ordering::Relaxed) > 1 && found == expected + 1 =>
            {
                let current = self.call("load_weights", || self.inner.load_weights()).await?;
                if current.version == found && current.weights == *weights {
                    warn!(
                        backend = self.inner.backend_name(),
                        version = found,
                        "Weights save committed before its retry; keeping the committed version"
                    );
                    Ok(found)
                } else {
                    Err(StoreError::VersionConflict { expected, found })
                }
            }
            other => other,
        }
    }

    async fn record_run(&self, run: &RunRecord) -> Result<(), StoreError> {
        self.call("record_run", || self.inner.record_run(run)).await
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>, StoreError> {
        self.call("load_run", || self.inner.load_run(run_id)).await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
