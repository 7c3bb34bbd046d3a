//! Reachplan Worker
//!
//! Consumes learning jobs from the Redis queue and, when
//! `LEARNING_INTERVAL_SECONDS` is set, schedules periodic learning runs.

use apalis_redis::RedisStorage;
use dotenvy::dotenv;
use reachplan::config;
use reachplan::core::bootstrap;
use reachplan::core::runtime::{LearningRuntime, RuntimeConfig};
use reachplan::core::scheduler::JobScheduler;
use reachplan::jobs::{JobContext, LearnFromFeedbackJob, RedisLearningDispatcher};
use reachplan::learning::{LearningDispatcher, RunTracker};
use reachplan::logging;
use reachplan::metrics::Metrics;
use reachplan::store::StoreConfig;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    let logging_config = logging::LoggingConfig::from_env();
    logging::init_logging(&logging_config);

    let env = config::get_environment();
    let learning_interval = config::get_learning_interval_seconds();
    info!("Starting Reachplan Worker");
    info!(environment = %env, log_format = %logging_config.format, "Environment");

    let metrics = Arc::new(Metrics::new()?);
    let store = bootstrap::build_store(StoreConfig::default(), Some(&metrics))
        .await
        .map_err(|e| format!("Learning store required for worker: {}", e))?;

    let tracker = RunTracker::new();
    let learning = bootstrap::build_learning_service(store, tracker.clone(), Some(metrics));

    info!("Initializing Apalis Redis storage...");
    let redis_url = config::get_redis_url();
    let conn = apalis_redis::connect(redis_url).await?;
    let storage: RedisStorage<LearnFromFeedbackJob> = RedisStorage::new(conn);
    info!("Apalis Redis storage initialized");

    let runtime_config = RuntimeConfig {
        learning_interval_seconds: learning_interval,
        ..RuntimeConfig::default()
    };
    let runtime = LearningRuntime::new(
        runtime_config,
        Arc::new(JobContext::new(learning)),
        storage.clone(),
    );
    let worker_handle = runtime.start_worker();

    let scheduler = if learning_interval > 0 {
        info!(interval = learning_interval, "Scheduled learning: every {} seconds", learning_interval);
        let dispatcher: Arc<dyn LearningDispatcher> =
            Arc::new(RedisLearningDispatcher::new(storage, tracker));
        let scheduler = JobScheduler::new(dispatcher, learning_interval)
            .map_err(|e| format!("Failed to create scheduler: {}", e))?;
        scheduler
            .start()
            .await
            .map_err(|e| format!("Failed to start scheduler: {}", e))?;
        Some(scheduler)
    } else {
        warn!("LEARNING_INTERVAL_SECONDS is 0, only feedback-triggered runs will execute");
        None
    };

    // Graceful shutdown
    info!("Worker started, waiting for shutdown signal...");
    signal::ctrl_c().await?;
    info!("Shutting down worker...");
    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    worker_handle.abort();
    info!("Worker stopped");

    Ok(())
}
