//! Vigil Shared Library
//!
//! This crate contains the telemetry core shared by the Vigil API server and
//! the dashboard CLI.
//!
//! # Modules
//!
//! - [`models`] - Log records and the dashboard snapshot
//! - [`telemetry`] - Counter registry, structured logger and log sinks
//! - [`system`] - Host and process resource probe
//!
//! # Example
//!
//! ```
//! use shared::fields;
//! use shared::telemetry::sinks::RingBufferSink;
//! use shared::telemetry::{declare_standard_metrics, MetricRegistry, StructuredLogger};
//! use std::sync::Arc;
//!
//! let registry = MetricRegistry::new_shared();
//! declare_standard_metrics(&registry).unwrap();
//!
//! let ring = Arc::new(RingBufferSink::new(50));
//! let logger = StructuredLogger::new()
//!     .with_sink(ring.clone())
//!     .with_registry(registry.clone());
//!
//! logger.info("Server started", fields! { "port" => 8080 });
//! assert_eq!(ring.lines().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod models;
pub mod system;
pub mod telemetry;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
