//! Demonstration endpoints.
//!
//! Surfaces that exist to generate interesting telemetry: a root info page,
//! a listing, an endpoint that always faults, one that always panics, and a
//! deliberately slow one.

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use shared::fields;

/// Root endpoint response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    /// Service description.
    pub message: String,
    /// Always "running".
    pub status: String,
}

/// User listing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    /// User names.
    pub users: Vec<String>,
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

/// Creates the demonstration routes.
pub fn demo_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/api/users", get(list_users))
        .route("/api/error", get(simulated_error))
        .route("/api/panic", get(simulated_panic))
        .route("/api/slow", get(slow))
}

async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    state.logger().info("Home page accessed", fields!());
    Json(RootResponse {
        message: "Vigil telemetry service".to_string(),
        status: "running".to_string(),
    })
}

async fn list_users(State(state): State<AppState>) -> Json<UsersResponse> {
    state.logger().info("Fetching users", fields!());
    Json(UsersResponse {
        users: ["Alice", "Bob", "Charlie"].map(String::from).to_vec(),
    })
}

/// Always fails; the fault is counted and logged by the instrumentor.
async fn simulated_error() -> Result<Json<MessageResponse>, AppError> {
    Err(AppError::fault("This is a simulated error"))
}

/// Always panics; the panic is caught and turned into a fault.
async fn simulated_panic() -> Json<MessageResponse> {
    panic!("Simulated handler panic")
}

async fn slow(State(state): State<AppState>) -> Json<MessageResponse> {
    state.logger().warn("Slow endpoint accessed", fields!());
    tokio::time::sleep(state.slow_delay()).await;
    Json(MessageResponse {
        message: "Slow response completed".to_string(),
    })
}
