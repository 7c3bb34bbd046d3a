//! Integration tests for the API Server
//!
//! Tests HTTP endpoints, health checks, metrics, planning estimates and the
//! feedback learning loop.

#[path = "api_server/test_utils.rs"]
mod test_utils;

use reachplan::store::LearningStore;
use serde_json::{json, Value};
use uuid::Uuid;

use test_utils::TestApiServer;

fn feedback(plan_id: &str) -> Value {
    json!({
        "plan_id": plan_id,
        "plan_data": {
            "audiences": [{ "persona": "Comedy Lover" }],
            "lineItems": [{ "platform": "Meta", "budget": 1000 }],
            "vertical_key": "Automotive"
        },
        "overall_rating": 5,
        "approved": true
    })
}

#[tokio::test]
async fn health_endpoint_reports_healthy_status() {
    let app = TestApiServer::new().await;
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["uptime_seconds"].as_u64().is_some());
    assert_eq!(body["service"], "reachplan-api");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["personas_loaded"], 3);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_metrics() {
    let app = TestApiServer::new().await;
    let _ = app.server.get("/health").await;

    let response = app.server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);

    let body = response.text();
    for name in [
        "http_requests_total",
        "http_request_duration_seconds",
        "http_requests_in_flight",
        "feedback_submissions_total",
    ] {
        assert!(body.contains(name), "Expected {} metric", name);
    }
}

#[tokio::test]
async fn reach_estimate_discounts_overlap() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/reach/estimate")
        .json(&json!({ "selectedPersonaNames": ["Comedy Lover", "Horror Fan", "Nobody"] }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["totalRaw"], 1_500_000);
    assert_eq!(body["uniqueReach"], 600_000);
    assert_eq!(body["overlapPercent"], 60);
    assert_eq!(body["unresolved"], json!(["Nobody"]));
}

#[tokio::test]
async fn inventory_estimate_reads_reference_tables() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/inventory/estimate")
        .json(&json!({ "selectedFormatIds": ["f-leaderboard"] }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["totalRequests"], 1_000_000);
    assert_eq!(body["totalImpressions"], 600_000);
    assert_eq!(body["personaRatio"], 1.0);
    assert!(body["availableInventory"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn site_ranking_prefers_matching_category() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/sites/rank")
        .json(&json!({ "personas": ["Comedy Lover"] }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let sites = body.as_array().unwrap();
    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0]["name"], "Laugh Daily");
}

#[tokio::test]
async fn feedback_is_stored_and_queues_a_run() {
    let app = TestApiServer::new().await;
    let response = app.server.post("/api/feedback").json(&feedback("plan-1")).await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    assert_eq!(body["plan_id"], "plan-1");
    assert!(!body["feedback_id"].as_str().unwrap().is_empty());
    let run_id = body["run_id"].as_str().expect("run queued").to_string();

    let stored = app.store.list_feedback().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, body["feedback_id"].as_str().unwrap());

    let run = app.server.get(&format!("/api/learning/runs/{}", run_id)).await;
    assert_eq!(run.status_code(), 200);
    let run: Value = run.json();
    assert_eq!(run["trigger"]["kind"], "feedback_submitted");
}

#[tokio::test]
async fn feedback_without_plan_id_is_rejected() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/feedback")
        .json(&json!({ "overall_rating": 4 }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 400);
    assert!(app.store.list_feedback().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_run_is_not_found() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .get(&format!("/api/learning/runs/{}", Uuid::new_v4()))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn run_finished_by_another_process_reports_its_outcome() {
    let app = TestApiServer::with_remote_worker().await;
    let response = app.server.post("/api/feedback").json(&feedback("plan-1")).await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    let run_id = body["run_id"].as_str().expect("run queued").to_string();

    let mut state = String::new();
    for _ in 0..200 {
        let run: Value = app
            .server
            .get(&format!("/api/learning/runs/{}", run_id))
            .await
            .json();
        state = run["status"]["state"].as_str().unwrap_or_default().to_string();
        if state != "queued" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    // One feedback record is below the minimum history, so the worker skips
    assert_eq!(state, "skipped");
}

#[tokio::test]
async fn manual_analysis_skips_without_enough_feedback() {
    let app = TestApiServer::new().await;
    let _ = app.server.post("/api/feedback").json(&feedback("plan-1")).await;

    let response = app.server.post("/api/learning/analyze").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["has_sufficient_data"], false);
    assert_eq!(body["persisted"], false);
}

#[tokio::test]
async fn learning_loop_updates_recommendation_scores() {
    let app = TestApiServer::new().await;
    for i in 0..20 {
        let response = app
            .server
            .post("/api/feedback")
            .json(&feedback(&format!("plan-{}", i)))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let response = app.server.post("/api/learning/analyze").await;
    assert_eq!(response.status_code(), 200);
    let report: Value = response.json();
    assert_eq!(report["has_sufficient_data"], true);
    assert_eq!(report["persisted"], true);
    assert_eq!(report["feedback_count"], 20);

    let weights: Value = app.server.get("/api/learning/weights").await.json();
    assert!(weights["version"].as_u64().unwrap() >= 1);
    let comedy = &weights["weights"]["personas"]["comedy lover"];
    assert_eq!(comedy["selection_count"], 20);
    assert_eq!(comedy["confidence"], 1.0);
    assert_eq!(weights["weights"]["verticals"]["automotive"]["total_plans"], 20);

    let response = app
        .server
        .post("/api/recommendations/adjust")
        .json(&json!({ "persona": "Comedy Lover", "baseScore": 10.0 }))
        .await;
    assert_eq!(response.status_code(), 200);
    let adjusted: Value = response.json();
    // Every record rated 5 and approved: the score saturates at 1.0
    let multiplier = adjusted["multiplier"].as_f64().unwrap();
    assert!((multiplier - 1.5).abs() < 1e-9);
    assert!((adjusted["adjusted_score"].as_f64().unwrap() - 15.0).abs() < 1e-9);
}

#[tokio::test]
async fn batch_adjustment_keeps_unknown_personas_neutral() {
    let app = TestApiServer::new().await;
    let response = app
        .server
        .post("/api/recommendations/adjust")
        .json(&json!({
            "recommendations": [
                { "persona": "Comedy Lover", "score": 4.0 },
                { "name": "Horror Fan", "score": 2.0 }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    let items = body["recommendations"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["multiplier"], 1.0);
    assert_eq!(items[1]["adjusted_score"], 2.0);
    assert_eq!(items[1]["persona"], "Horror Fan");
}
