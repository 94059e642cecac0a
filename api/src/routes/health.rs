//! Health check endpoint.
//!
//! Provides a simple liveness endpoint for load balancers and monitoring systems.

use crate::state::AppState;
use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Current server time.
    pub timestamp: DateTime<Utc>,
}

/// Creates the health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
///
/// Returns a fixed-shape JSON document; it succeeds whenever the process can respond.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "vigil-api",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
