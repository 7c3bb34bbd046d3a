//! Process wiring shared by the binaries

use crate::config;
use crate::db::PostgresStore;
use crate::learning::{LearningConfig, LearningService, LearningWeightsEngine, RunTracker};
use crate::metrics::Metrics;
use crate::services::{
    FileReferenceDataProvider, HttpReferenceDataProvider, ReferenceData, ReferenceDataProvider,
};
use crate::store::{FileStore, LearningStore, RetryingStore, StoreConfig, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

pub const REFERENCE_DATA_FILE: &str = "reference_data.json";

/// PostgreSQL when `DATABASE_URL` is set, JSON files under `DATA_DIR` otherwise.
/// Either way the store is wrapped with timeouts and retries.
pub async fn build_store(
    store_config: StoreConfig,
    metrics: Option<&Metrics>,
) -> Result<Arc<dyn LearningStore>, StoreError> {
    let inner: Arc<dyn LearningStore> = match config::get_database_url() {
        Some(url) => {
            info!("Initializing PostgreSQL store...");
            Arc::new(PostgresStore::connect(&url).await?)
        }
        None => {
            let dir = config::get_data_dir();
            info!(dir = %dir.display(), "DATABASE_URL not set, using file store");
            Arc::new(FileStore::open(dir).await?)
        }
    };

    if let Some(metrics) = metrics {
        metrics.store_connected.set(1.0);
    }
    info!(backend = inner.backend_name(), "Learning store ready");

    Ok(Arc::new(RetryingStore::new(inner, store_config)))
}

pub fn build_learning_service(
    store: Arc<dyn LearningStore>,
    tracker: RunTracker,
    metrics: Option<Arc<Metrics>>,
) -> Arc<LearningService> {
    let service = LearningService::new(
        LearningWeightsEngine::new(LearningConfig::default()),
        store,
        tracker,
    );
    let service = match metrics {
        Some(metrics) => service.with_metrics(metrics),
        None => service,
    };
    Arc::new(service)
}

/// Load reference tables from `REFERENCE_DATA_URL`, else from
/// `DATA_DIR/reference_data.json`. Failures leave the tables empty: estimates
/// then degrade to zero contributions instead of refusing to start.
pub async fn load_reference_data() -> ReferenceData {
    let provider: Box<dyn ReferenceDataProvider> = match config::get_reference_data_url() {
        Some(url) => match HttpReferenceDataProvider::new(url) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                warn!(error = %e, "Failed to build reference data client");
                return ReferenceData::empty();
            }
        },
        None => {
            let path = config::get_data_dir().join(REFERENCE_DATA_FILE);
            if !path.exists() {
                warn!(
                    path = %path.display(),
                    "No reference data source configured, starting with empty tables"
                );
                return ReferenceData::empty();
            }
            Box::new(FileReferenceDataProvider::new(path))
        }
    };

    match provider.load().await {
        Ok(data) => data,
        Err(e) => {
            warn!(error = %e, "Failed to load reference data, starting with empty tables");
            ReferenceData::empty()
        }
    }
}
