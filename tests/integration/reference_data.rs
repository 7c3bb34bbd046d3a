//! Integration tests for loading reference tables over HTTP

use reachplan::services::{
    FileReferenceDataProvider, HttpReferenceDataProvider, ReferenceDataError,
    ReferenceDataProvider,
};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_required(server: &MockServer) {
    mount_json(
        server,
        "/api/audiences",
        json!({
            "headers": ["Persona", "Selangor", "Johor", "Total"],
            "data": [
                ["Comedy Lover", "1,000", "500", "1,500"],
                { "Persona": "Football Fanatic", "Selangor": 300, "Johor": 200 }
            ]
        }),
    )
    .await;
    mount_json(
        server,
        "/api/inventory",
        json!({
            "Leaderboard": { "avgMonthlyRequests": 1000.0, "avgMonthlyImpressions": 700.0 }
        }),
    )
    .await;
}

#[tokio::test]
async fn loads_all_tables_from_backend() {
    let server = MockServer::start().await;
    mount_required(&server).await;
    mount_json(
        &server,
        "/api/formats",
        json!([{ "id": "f1", "name": "Leaderboard", "type": "standard" }]),
    )
    .await;
    mount_json(
        &server,
        "/api/sites",
        json!([{ "name": "Laugh Daily", "category": "Entertainment", "monthly_impressions": 10 }]),
    )
    .await;

    let provider = HttpReferenceDataProvider::new(server.uri()).unwrap();
    let data = provider.load().await.unwrap();

    assert_eq!(data.personas.len(), 2);
    let sizes: Vec<u64> = data.personas.iter().map(|p| p.size).collect();
    assert_eq!(sizes, vec![1500, 500]);
    assert!(data.inventory.contains("leaderboard"));
    assert_eq!(data.formats.len(), 1);
    assert_eq!(data.sites.len(), 1);
}

#[tokio::test]
async fn optional_tables_fall_back_to_empty() {
    let server = MockServer::start().await;
    mount_required(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/formats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = HttpReferenceDataProvider::new(format!("{}/", server.uri())).unwrap();
    let data = provider.load().await.unwrap();

    assert_eq!(data.personas.len(), 2);
    assert!(data.formats.is_empty());
    assert!(data.sites.is_empty());
}

#[tokio::test]
async fn missing_audience_table_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/audiences"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = HttpReferenceDataProvider::new(server.uri()).unwrap();
    let err = provider.load().await.unwrap_err();

    assert!(matches!(err, ReferenceDataError::Status { status: 503, .. }));
}

#[tokio::test]
async fn bundle_file_loads_from_disk() {
    let file = std::env::temp_dir().join(format!("reachplan-reference-{}.json", Uuid::new_v4()));
    std::fs::write(
        &file,
        json!({
            "audiences": { "headers": ["name", "Penang"], "data": [["Tech Savvy", "42"]] },
            "inventory": {},
            "formats": [],
            "sites": []
        })
        .to_string(),
    )
    .unwrap();

    let data = FileReferenceDataProvider::new(&file).load().await.unwrap();
    assert_eq!(data.personas.iter().next().unwrap().size, 42);

    let _ = std::fs::remove_file(file);
}
