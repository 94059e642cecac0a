//! Data models for the Vigil telemetry pipeline.
//!
//! This module contains the log record, the health grade and the dashboard
//! snapshot types.

pub mod health;
pub mod log;
pub mod snapshot;

pub use health::{analyze_health, HealthReport, HealthStatus};
pub use log::{Fields, LogLevel, LogRecord, ParseLogLevelError};
pub use snapshot::{Snapshot, SystemMetrics, Usage};
