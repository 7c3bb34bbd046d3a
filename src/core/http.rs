//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, warn, Level};
use uuid::Uuid;

use crate::inventory::{InventoryAvailabilityCalculator, InventoryEstimate, InventoryRequest};
use crate::learning::{
    adjust_recommendation, LearningDispatcher, LearningError, LearningRunReport,
    LearningService, LearningTrigger, RecommendationAdjustment, RecommendationRequest,
    RunRecord,
};
use crate::metrics::Metrics;
use crate::models::FeedbackRecord;
use crate::reach::{rank_sites, ReachEstimate, ReachEstimator, ReachRequest, SiteRelevance};
use crate::services::ReferenceData;
use crate::store::{StoreError, VersionedWeights};

#[derive(Clone)]
pub struct AppState {
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub reference: Arc<ReferenceData>,
    pub reach: Arc<ReachEstimator>,
    pub inventory: Arc<InventoryAvailabilityCalculator>,
    pub learning: Arc<LearningService>,
    pub dispatcher: Arc<dyn LearningDispatcher>,
}

impl AppState {
    /// State with default estimator configs
    pub fn new(
        metrics: Arc<Metrics>,
        reference: ReferenceData,
        learning: Arc<LearningService>,
        dispatcher: Arc<dyn LearningDispatcher>,
    ) -> Self {
        Self {
            health: Arc::new(RwLock::new(HealthStatus::default())),
            metrics,
            start_time: Arc::new(Instant::now()),
            reference: Arc::new(reference),
            reach: Arc::new(ReachEstimator::default()),
            inventory: Arc::new(InventoryAvailabilityCalculator::default()),
            learning,
            dispatcher,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "reachplan-api",
        "store": state.learning.store().backend_name(),
        "personas_loaded": state.reference.personas.len(),
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_in_flight.dec();

    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Constraint(_) => StatusCode::CONFLICT,
        e if e.is_transient() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn learning_status(e: &LearningError) -> StatusCode {
    match e {
        LearningError::InvalidFeedback(_) => StatusCode::BAD_REQUEST,
        LearningError::Store(e) => store_status(e),
        LearningError::ConflictRetriesExhausted(_) => StatusCode::CONFLICT,
    }
}

async fn estimate_reach(
    State(state): State<AppState>,
    Json(request): Json<ReachRequest>,
) -> Json<ReachEstimate> {
    Json(state.reach.estimate(&state.reference.personas, &request))
}

async fn estimate_inventory(
    State(state): State<AppState>,
    Json(request): Json<InventoryRequest>,
) -> Json<InventoryEstimate> {
    let reference = &state.reference;
    Json(state.inventory.estimate_for_request(
        &reference.formats,
        &reference.inventory,
        &reference.personas,
        &request,
    ))
}

#[derive(Debug, Deserialize)]
struct SiteRankRequest {
    #[serde(default, alias = "selectedPersonaNames")]
    personas: Vec<String>,
}

async fn rank_sites_handler(
    State(state): State<AppState>,
    Json(request): Json<SiteRankRequest>,
) -> Json<Vec<SiteRelevance>> {
    let reference = &state.reference;
    Json(rank_sites(
        &reference.personas,
        &reference.sites,
        &request.personas,
        &state.reach.config().relevance_overlap,
    ))
}

#[derive(Debug, Serialize)]
struct FeedbackAccepted {
    feedback_id: String,
    plan_id: String,
    /// Absent when the learning run could not be queued
    run_id: Option<Uuid>,
}

/// Store feedback, then queue a learning run. A queueing failure is logged
/// and does not fail the submission.
async fn submit_feedback(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<FeedbackAccepted>), StatusCode> {
    let record: FeedbackRecord = serde_json::from_value(body).map_err(|e| {
        warn!(error = %e, "Rejected unreadable feedback body");
        StatusCode::BAD_REQUEST
    })?;

    let record = state.learning.submit_feedback(record).await.map_err(|e| {
        warn!(error = %e, "Failed to store feedback");
        learning_status(&e)
    })?;

    let run_id = match state
        .dispatcher
        .dispatch(LearningTrigger::FeedbackSubmitted {
            plan_id: record.plan_id.clone(),
        })
        .await
    {
        Ok(run_id) => Some(run_id),
        Err(e) => {
            error!(error = %e, plan_id = %record.plan_id, "Failed to queue learning run");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(FeedbackAccepted {
            feedback_id: record.id,
            plan_id: record.plan_id,
            run_id,
        }),
    ))
}

/// Run the learning cycle now and wait for it
async fn analyze_now(
    State(state): State<AppState>,
) -> Result<Json<LearningRunReport>, StatusCode> {
    state
        .learning
        .analyze_now(LearningTrigger::Manual)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Manual learning run failed");
            learning_status(&e)
        })
}

async fn get_weights(State(state): State<AppState>) -> Result<Json<VersionedWeights>, StatusCode> {
    state.learning.current_weights().await.map(Json).map_err(|e| {
        error!(error = %e, "Failed to load learning weights");
        learning_status(&e)
    })
}

async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<Uuid>,
) -> Result<Json<RunRecord>, StatusCode> {
    // A worker process runs Redis-dispatched jobs, so the local tracker only
    // ever sees them queued. Finished runs are read back from the store.
    let local = state.dispatcher.tracker().get(run_id).await;
    if let Some(record) = local.as_ref().filter(|r| r.status.is_terminal()) {
        return Ok(Json(record.clone()));
    }

    match state.learning.store().load_run(run_id).await {
        Ok(Some(stored)) => Ok(Json(stored)),
        Ok(None) => local.map(Json).ok_or(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(run_id = %run_id, error = %e, "Failed to load stored learning run");
            local.map(Json).ok_or(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AdjustRequest {
    Batch {
        recommendations: Vec<RecommendationRequest>,
    },
    Single(RecommendationRequest),
}

async fn adjust_recommendations(
    State(state): State<AppState>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<Value>, StatusCode> {
    let stored = state.learning.current_weights().await.map_err(|e| {
        error!(error = %e, "Failed to load learning weights");
        learning_status(&e)
    })?;
    let engine = state.learning.engine();

    let body = match request {
        AdjustRequest::Single(request) => {
            json!(adjust_recommendation(engine, &stored.weights, &request))
        }
        AdjustRequest::Batch { recommendations } => {
            let adjusted: Vec<RecommendationAdjustment> = recommendations
                .iter()
                .map(|r| adjust_recommendation(engine, &stored.weights, r))
                .collect();
            json!({ "recommendations": adjusted })
        }
    };
    Ok(Json(body))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/reach/estimate", post(estimate_reach))
        .route("/api/inventory/estimate", post(estimate_inventory))
        .route("/api/sites/rank", post(rank_sites_handler))
        .route("/api/feedback", post(submit_feedback))
        .route("/api/learning/analyze", post(analyze_now))
        .route("/api/learning/weights", get(get_weights))
        .route("/api/learning/runs/{id}", get(get_run))
        .route("/api/recommendations/adjust", post(adjust_recommendations))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    info!(
        "Metrics endpoint available at http://0.0.0.0:{}/metrics",
        port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
