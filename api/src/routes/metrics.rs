//! Metrics export endpoint.
//!
//! Serves every registered family in the Prometheus text exposition format.
//! Host gauges are refreshed just before encoding.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::header, response::IntoResponse, routing::get, Router};
use shared::telemetry::{EXPOSITION_CONTENT_TYPE, SYSTEM_CPU_USAGE, SYSTEM_MEMORY_USAGE};

/// Creates the metrics export routes.
pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(export_metrics))
}

/// Renders the exposition document.
///
/// # Errors
///
/// Returns an error if the registry cannot be read or encoded.
pub fn render_exposition(state: &AppState) -> Result<String, AppError> {
    let system = state.probe().system_metrics();
    let registry = state.registry();
    registry
        .set_gauge(SYSTEM_CPU_USAGE, system.cpu)
        .and_then(|()| registry.set_gauge(SYSTEM_MEMORY_USAGE, system.memory.percent))
        .and_then(|()| registry.render())
        .map_err(|e| AppError::Internal(e.into()))
}

async fn export_metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = render_exposition(&state)?;
    Ok(([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body))
}
