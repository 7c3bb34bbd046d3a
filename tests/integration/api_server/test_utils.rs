//! Test utilities for API server integration tests

use apalis::prelude::Data;
use async_trait::async_trait;
use axum_test::TestServer;
use reachplan::core::http::{create_router, AppState};
use reachplan::jobs::handlers::handle_learning_run;
use reachplan::jobs::{JobContext, LearnFromFeedbackJob};
use reachplan::learning::{
    DispatchError, InProcessLearningQueue, LearningConfig, LearningDispatcher, LearningService,
    LearningTrigger, LearningWeightsEngine, RunTracker,
};
use reachplan::metrics::Metrics;
use reachplan::models::{
    AdFormat, FormatCatalogue, FormatInventoryRecord, FormatType, InventoryTable, Persona,
    PersonaCategory, Site,
};
use reachplan::reach::PersonaTable;
use reachplan::services::ReferenceData;
use reachplan::store::{LearningStore, MemoryStore};
use std::sync::Arc;
use uuid::Uuid;

pub fn reference_data() -> ReferenceData {
    ReferenceData {
        personas: PersonaTable::new(vec![
            Persona::new("Comedy Lover", PersonaCategory::Entertainment, 1_000_000),
            Persona::new("Horror Fan", PersonaCategory::Entertainment, 500_000),
            Persona::new("Football Fanatic", PersonaCategory::Sports, 500_000),
        ]),
        inventory: InventoryTable::from_records(vec![(
            "Leaderboard".to_string(),
            FormatInventoryRecord {
                avg_monthly_requests: 1_000_000.0,
                avg_monthly_impressions: 600_000.0,
                ..FormatInventoryRecord::default()
            },
        )]),
        formats: FormatCatalogue::new(vec![AdFormat::new(
            "f-leaderboard",
            "Leaderboard",
            FormatType::Standard,
        )]),
        sites: vec![
            Site {
                name: "Laugh Daily".to_string(),
                category: PersonaCategory::Entertainment,
                monthly_impressions: 100_000,
            },
            Site {
                name: "Goal Post".to_string(),
                category: PersonaCategory::Sports,
                monthly_impressions: 80_000,
            },
        ],
    }
}

/// Test helper for API server integration tests
#[allow(dead_code)]
pub struct TestApiServer {
    pub server: TestServer,
    pub metrics: Arc<Metrics>,
    pub store: Arc<MemoryStore>,
    pub learning: Arc<LearningService>,
}

impl TestApiServer {
    pub async fn new() -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let store = Arc::new(MemoryStore::new());
        let learning = Arc::new(
            LearningService::new(
                LearningWeightsEngine::new(LearningConfig::default()),
                store.clone() as Arc<dyn LearningStore>,
                RunTracker::new(),
            )
            .with_metrics(metrics.clone()),
        );
        let (queue, _handle) = InProcessLearningQueue::start(learning.clone());
        let dispatcher: Arc<dyn LearningDispatcher> = Arc::new(queue);

        let state = AppState::new(metrics.clone(), reference_data(), learning.clone(), dispatcher);
        let app = create_router(state);
        let server = TestServer::new(app).expect("start test server");

        Self {
            server,
            metrics,
            store,
            learning,
        }
    }
}

/// Stands in for the Redis queue: the API side only records `Queued`, and
/// the job runs through the worker handler on a service with its own tracker
struct RemoteWorkerDispatcher {
    tracker: RunTracker,
    worker: Arc<JobContext>,
}

#[async_trait]
impl LearningDispatcher for RemoteWorkerDispatcher {
    async fn dispatch(&self, trigger: LearningTrigger) -> Result<Uuid, DispatchError> {
        let job = LearnFromFeedbackJob::new(trigger.clone());
        let run_id = job.run_id;
        self.tracker.register(run_id, trigger).await;

        let worker = self.worker.clone();
        tokio::spawn(async move {
            let _ = handle_learning_run(job, Data::new(worker)).await;
        });
        Ok(run_id)
    }

    fn tracker(&self) -> &RunTracker {
        &self.tracker
    }
}

impl TestApiServer {
    /// API whose learning runs execute in a separate "worker" service that
    /// shares only the store
    pub async fn with_remote_worker() -> Self {
        let metrics = Arc::new(Metrics::new().expect("metrics initialization"));
        let store = Arc::new(MemoryStore::new());
        let api_tracker = RunTracker::new();
        let learning = Arc::new(LearningService::new(
            LearningWeightsEngine::new(LearningConfig::default()),
            store.clone() as Arc<dyn LearningStore>,
            api_tracker.clone(),
        ));
        let worker = Arc::new(LearningService::new(
            LearningWeightsEngine::new(LearningConfig::default()),
            store.clone() as Arc<dyn LearningStore>,
            RunTracker::new(),
        ));
        let dispatcher: Arc<dyn LearningDispatcher> = Arc::new(RemoteWorkerDispatcher {
            tracker: api_tracker,
            worker: Arc::new(JobContext::new(worker)),
        });

        let state = AppState::new(metrics.clone(), reference_data(), learning.clone(), dispatcher);
        let server = TestServer::new(create_router(state)).expect("start test server");

        Self {
            server,
            metrics,
            store,
            learning,
        }
    }
}
