//! Common test utilities and helpers for integration tests.
//!
//! This module provides shared functionality used across all integration tests,
//! including test app setup and HTTP request helpers.

use api::{create_router, AppState};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;

/// Ring capacity large enough to hold every record a test produces.
pub const TEST_RING_CAPACITY: usize = 500;

/// Creates a test router backed by an in-memory logger.
///
/// # Returns
///
/// A tuple containing the configured router and the app state.
pub fn test_app() -> (Router, AppState) {
    let state = AppState::in_memory(TEST_RING_CAPACITY);
    let router = create_router(state.clone());
    (router, state)
}

/// Sends a GET request and returns the raw response parts.
pub async fn get_raw(app: Router, uri: &str) -> (StatusCode, HeaderMap, String) {
    let response = tower::ServiceExt::oneshot(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(body_bytes.to_vec()).unwrap();

    (status, headers, body)
}

/// Helper to make a GET request.
///
/// # Returns
///
/// A tuple containing the response status code and parsed JSON response body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get_raw(app, uri).await;
    let json: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

/// Helper to make a GET request for a text body.
pub async fn get_text(app: Router, uri: &str) -> (StatusCode, String) {
    let (status, _, body) = get_raw(app, uri).await;
    (status, body)
}
