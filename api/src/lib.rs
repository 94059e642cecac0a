//! Vigil API Server
//!
//! This crate provides the instrumented HTTP server of the Vigil telemetry
//! pipeline. Every request is timed and counted, structured log records fan
//! out to the configured sinks, a background chaos generator keeps the
//! pipeline populated with synthetic failures, and a system monitor logs the
//! host's load every few seconds.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - Demonstration routes (`/`, `/api/users`, `/api/error`, `/api/slow`)
//! - A Prometheus text exposition at `/metrics`
//! - A dashboard snapshot at `/api/data`
//! - A liveness check at `/health`
//!
//! # Example
//!
//! ```no_run
//! use api::run_server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run_server().await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod chaos;
mod config;
pub mod error;
pub mod instrument;
pub mod monitor;
mod routes;
mod state;

pub use config::{ChaosConfig, Config, MonitorConfig};
pub use routes::{build_snapshot, render_exposition};
pub use state::AppState;

use anyhow::Result;
use axum::{middleware, Router};
use chaos::ChaosGenerator;
use monitor::SystemMonitor;
use shared::fields;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

/// Runs the Vigil API server.
///
/// This function initializes the server with configuration from environment variables
/// and starts listening for incoming connections. It handles graceful shutdown on
/// SIGTERM/SIGINT signals.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server() -> Result<()> {
    let config = Config::from_env()?;
    run_server_with_config(config).await
}

/// Runs the Vigil API server with the provided configuration.
///
/// This is useful for testing or when you want to provide configuration programmatically.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The log sinks cannot be set up
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        remote_index = config.elasticsearch_url.is_some(),
        log_file = ?config.log_file,
        "Vigil API server starting"
    );

    let state = AppState::from_config(&config)?;

    let chaos = config.chaos.enabled.then(|| {
        tracing::info!(
            interval_secs = config.chaos.interval.as_secs(),
            "Chaos generator enabled"
        );
        ChaosGenerator::new(state.clone(), config.chaos.clone()).spawn()
    });
    let monitor = config.monitor.enabled.then(|| {
        tracing::info!(
            interval_secs = config.monitor.interval.as_secs(),
            "System monitor enabled"
        );
        SystemMonitor::new(state.clone(), &config.monitor).spawn()
    });

    let app = create_router(state.clone());
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, "Listening for connections");
    state.logger().info(
        &format!("Server running on port {}", config.port),
        fields! { "service" => state.service_name() },
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    for handle in [chaos, monitor].into_iter().flatten() {
        handle.abort();
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// Panics inside handlers are caught and converted into faults before the
/// instrumentor sees the response, so they are counted like any other
/// handler fault.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::demo_routes())
        .merge(routes::metrics_routes())
        .merge(routes::snapshot_routes())
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            instrument::instrument,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
