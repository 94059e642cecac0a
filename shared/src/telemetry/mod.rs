//! Telemetry primitives: metrics, structured logging and log sinks.
//!
//! ```text
//! request completion ─┐
//! chaos tick ─────────┼──► MetricRegistry (counters, latency histogram, gauges)
//! monitor tick ───────┴──► StructuredLogger ──► ring / file / console / remote-index
//! ```

pub mod logger;
pub mod redact;
pub mod registry;
pub mod sinks;

pub use logger::StructuredLogger;
pub use redact::redact;
pub use registry::{
    CounterSample, CounterSnapshot, MetricError, MetricRegistry, EXPOSITION_CONTENT_TYPE,
};

/// Requests served, by method, route template and status code.
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// Errors, by type (`server_error`, `random_error`, `sink_failure`).
pub const ERRORS_TOTAL: &str = "errors_total";

/// Log records emitted, by level.
pub const LOGS_GENERATED_TOTAL: &str = "logs_generated_total";

/// Request latency in seconds, by method and route template.
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Host CPU usage percentage.
pub const SYSTEM_CPU_USAGE: &str = "system_cpu_usage";

/// Host memory usage percentage.
pub const SYSTEM_MEMORY_USAGE: &str = "system_memory_usage";

/// Declares the metrics every Vigil process exports, including the
/// `process_*` collector.
///
/// # Errors
///
/// Returns an error if any of the metrics is already declared.
pub fn declare_standard_metrics(registry: &MetricRegistry) -> Result<(), MetricError> {
    registry.declare_counter(
        HTTP_REQUESTS_TOTAL,
        "Total HTTP requests",
        &["method", "route", "status"],
    )?;
    registry.declare_counter(ERRORS_TOTAL, "Total errors", &["type"])?;
    registry.declare_counter(
        LOGS_GENERATED_TOTAL,
        "Total number of log records generated",
        &["level"],
    )?;
    registry.declare_histogram(
        HTTP_REQUEST_DURATION_SECONDS,
        "Request latency",
        &["method", "route"],
        prometheus::DEFAULT_BUCKETS,
    )?;
    registry.declare_gauge(SYSTEM_CPU_USAGE, "Current CPU usage percentage")?;
    registry.declare_gauge(SYSTEM_MEMORY_USAGE, "Current RAM usage percentage")?;
    registry.register_process_collector()?;
    Ok(())
}
