//! Dashboard snapshot endpoint.
//!
//! Serves the current host metrics together with the recent log lines from
//! the logger's ring buffer, newest last, and a health grade.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use shared::models::Snapshot;

/// Creates the snapshot routes.
pub fn snapshot_routes() -> Router<AppState> {
    Router::new().route("/api/data", get(snapshot))
}

/// Builds a fresh snapshot; nothing is cached between calls.
#[must_use]
pub fn build_snapshot(state: &AppState) -> Snapshot {
    Snapshot::new(state.probe().system_metrics(), state.recent_logs().lines())
}

async fn snapshot(State(state): State<AppState>) -> Json<Snapshot> {
    Json(build_snapshot(&state))
}
