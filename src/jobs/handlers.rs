//! Job handlers for the learning queue

use crate::jobs::context::JobContext;
use crate::jobs::types::LearnFromFeedbackJob;
use apalis::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Handler for LearnFromFeedbackJob
///
/// Registers the run on the worker's tracker and executes it. Insufficient
/// feedback is a normal skip, not a job failure.
pub async fn handle_learning_run(
    job: LearnFromFeedbackJob,
    ctx: Data<Arc<JobContext>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    debug!(run_id = %job.run_id, trigger = ?job.trigger, "LearnFromFeedbackJob: received");

    ctx.learning
        .tracker()
        .register(job.run_id, job.trigger.clone())
        .await;

    let report = ctx.learning.run(job.run_id).await.map_err(|e| {
        Box::new(std::io::Error::other(format!("Learning run failed: {}", e)))
            as Box<dyn std::error::Error + Send + Sync>
    })?;

    info!(
        run_id = %job.run_id,
        persisted = report.persisted,
        version = report.version,
        feedback_count = report.feedback_count,
        "LearnFromFeedbackJob: completed"
    );
    Ok(())
}
