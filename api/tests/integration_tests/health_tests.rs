//! Integration tests for health check and the demonstration routes.

use axum::http::StatusCode;

use super::common::{get, test_app};

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = test_app();

    let (status, response) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "healthy");
    assert_eq!(response["service"], "vigil-api");
    assert!(response["timestamp"].is_string());
}

#[tokio::test]
async fn test_root_and_users() {
    let (app, _state) = test_app();

    let (status, response) = get(app.clone(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "running");

    let (status, response) = get(app, "/api/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["users"], serde_json::json!(["Alice", "Bob", "Charlie"]));
}

#[tokio::test]
async fn test_slow_route_logs_warning() {
    let (app, state) = test_app();

    let (status, response) = get(app, "/api/slow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], "Slow response completed");

    let lines = state.recent_logs().lines();
    assert!(lines.iter().any(|l| l.ends_with("| WARNING | Slow endpoint accessed")));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _state) = test_app();

    let (status, _) = get(app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
