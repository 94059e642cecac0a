//! Integration tests for the dashboard snapshot endpoint.

use axum::http::StatusCode;
use shared::models::Snapshot;

use super::common::{get, get_text, test_app};

#[tokio::test]
async fn test_snapshot_shape() {
    let (app, _state) = test_app();

    let (status, response) = get(app, "/api/data").await;
    assert_eq!(status, StatusCode::OK);

    let cpu = response["metrics"]["cpu"].as_f64().unwrap();
    let memory = response["metrics"]["memory"]["percent"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&cpu));
    assert!((0.0..=100.0).contains(&memory));
    assert!(response["logs"].is_array());
    assert!(["GOOD", "MODERATE", "CRITICAL"]
        .contains(&response["ai_status"].as_str().unwrap()));
}

#[tokio::test]
async fn test_snapshot_contains_prior_requests() {
    let (app, _state) = test_app();

    let (status, _) = get(app.clone(), "/api/users").await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_text(app, "/api/data").await;
    let snapshot: Snapshot = serde_json::from_str(&body).unwrap();

    assert!(snapshot
        .logs
        .iter()
        .any(|line| line.ends_with("| INFO | Fetching users")));
    assert!(snapshot
        .logs
        .iter()
        .any(|line| line.ends_with("| INFO | HTTP Request")));
    for line in &snapshot.logs {
        assert_eq!(line.split(" | ").count(), 3, "bad line {line}");
    }
}
