//! Integration tests for request instrumentation and fault handling.
//!
//! Tests cover:
//! - Fault counting under concurrent load
//! - Panic capture
//! - Route label normalization

use axum::http::StatusCode;
use shared::models::LogLevel;
use shared::telemetry::{ERRORS_TOTAL, HTTP_REQUESTS_TOTAL, LOGS_GENERATED_TOTAL};

use super::common::{get, test_app};

#[tokio::test]
async fn test_concurrent_faults_are_all_counted() {
    let (app, state) = test_app();

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { get(app, "/api/error").await })
        })
        .collect();

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    let registry = state.registry();
    assert_eq!(registry.get(ERRORS_TOTAL, &["server_error"]).unwrap(), 100);
    assert_eq!(
        registry
            .get(HTTP_REQUESTS_TOTAL, &["GET", "/api/error", "500"])
            .unwrap(),
        100
    );
    assert_eq!(registry.get(LOGS_GENERATED_TOTAL, &["error"]).unwrap(), 100);

    let error_records = state
        .recent_logs()
        .records()
        .into_iter()
        .filter(|r| r.level == LogLevel::Error && r.fields["status"] == 500)
        .count();
    assert_eq!(error_records, 100);
}

#[tokio::test]
async fn test_fault_detail_is_logged_not_returned() {
    let (app, state) = test_app();

    let (status, body) = get(app, "/api/error").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.to_string().contains("simulated"));

    let records = state.recent_logs().records();
    let fault = records
        .iter()
        .find(|r| r.level == LogLevel::Error)
        .unwrap();
    assert_eq!(fault.message, "Unhandled error");
    assert_eq!(fault.fields["error"], "This is a simulated error");
    assert_eq!(fault.fields["url"], "/api/error");
    assert_eq!(fault.fields["method"], "GET");
    assert!(fault.fields.contains_key("stack"));
}

#[tokio::test]
async fn test_panic_is_converted_to_fault() {
    let (app, state) = test_app();

    let (status, body) = get(app.clone(), "/api/panic").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    // Server keeps serving after the panic
    let (status, _) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        state
            .registry()
            .get(ERRORS_TOTAL, &["server_error"])
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn test_query_string_does_not_split_route_label() {
    let (app, state) = test_app();

    for uri in ["/api/users", "/api/users?page=1", "/api/users?page=2"] {
        let (status, _) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(
        state
            .registry()
            .get(HTTP_REQUESTS_TOTAL, &["GET", "/api/users", "200"])
            .unwrap(),
        3
    );
}

#[tokio::test]
async fn test_unmatched_route_uses_raw_path() {
    let (app, state) = test_app();

    let (status, _) = get(app, "/missing/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(
        state
            .registry()
            .get(HTTP_REQUESTS_TOTAL, &["GET", "/missing/page", "404"])
            .unwrap(),
        1
    );
}
