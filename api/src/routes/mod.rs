//! API route definitions.
//!
//! This module organizes all HTTP routes for the Vigil API server.

mod demo;
mod health;
mod metrics;
mod snapshot;

pub use demo::demo_routes;
pub use health::health_routes;
pub use metrics::{metrics_routes, render_exposition};
pub use snapshot::{build_snapshot, snapshot_routes};
