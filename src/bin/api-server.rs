//! Reachplan API Server
//!
//! HTTP API for reach, inventory and site estimates, feedback intake and
//! learning weights. Learning runs execute in-process unless
//! `LEARNING_DISPATCH=redis`, in which case the worker binary consumes them.

use dotenvy::dotenv;
use reachplan::config::{self, DispatchMode};
use reachplan::core::bootstrap;
use reachplan::core::http::{start_server, AppState};
use reachplan::core::scheduler::JobScheduler;
use reachplan::jobs::RedisLearningDispatcher;
use reachplan::learning::{InProcessLearningQueue, LearningDispatcher, RunTracker};
use reachplan::logging;
use reachplan::metrics::Metrics;
use reachplan::store::StoreConfig;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    let logging_config = logging::LoggingConfig::from_env();
    logging::init_logging(&logging_config);

    let port = config::get_port();
    let env = config::get_environment();
    info!("Starting Reachplan API Server");
    info!(environment = %env, log_format = %logging_config.format, "Environment");
    info!(port = port, "HTTP Server: http://0.0.0.0:{}", port);

    let metrics = Arc::new(Metrics::new()?);
    let store = bootstrap::build_store(StoreConfig::default(), Some(&metrics)).await?;
    let reference = bootstrap::load_reference_data().await;

    let tracker = RunTracker::new();
    let learning = bootstrap::build_learning_service(store, tracker.clone(), Some(metrics.clone()));

    let mut queue_handle = None;
    let dispatcher: Arc<dyn LearningDispatcher> = match config::get_dispatch_mode() {
        DispatchMode::Redis => {
            let redis_url = config::get_redis_url();
            info!("Learning runs dispatched to Redis for the worker");
            Arc::new(RedisLearningDispatcher::connect(&redis_url, tracker).await?)
        }
        DispatchMode::InProcess => {
            info!("Learning runs executed in-process");
            let (queue, handle) = InProcessLearningQueue::start(learning.clone());
            queue_handle = Some(handle);
            Arc::new(queue)
        }
    };

    // In Redis mode the worker owns the schedule
    let scheduler = match (config::get_dispatch_mode(), config::get_learning_interval_seconds()) {
        (DispatchMode::InProcess, interval) if interval > 0 => {
            let scheduler = JobScheduler::new(dispatcher.clone(), interval)
                .map_err(|e| format!("Failed to create scheduler: {}", e))?;
            scheduler
                .start()
                .await
                .map_err(|e| format!("Failed to start scheduler: {}", e))?;
            Some(scheduler)
        }
        _ => None,
    };

    let state = AppState::new(metrics, reference, learning, dispatcher);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, state).await {
            error!(error = %e, "HTTP server error");
        }
    });

    // Graceful shutdown
    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    if let Some(handle) = queue_handle {
        handle.abort();
    }
    info!("API server stopped");

    Ok(())
}
