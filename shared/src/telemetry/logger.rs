//! Structured logger with multi-sink fan-out.

use super::redact::redact;
use super::sinks::LogSink;
use super::{MetricRegistry, ERRORS_TOTAL, LOGS_GENERATED_TOTAL};
use crate::models::{Fields, LogLevel, LogRecord};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Builds log records and fans them out to a fixed set of sinks.
///
/// Delivery is best-effort. A sink that fails is skipped for that record: the
/// failure is counted and traced, but never reaches the caller and never
/// stops the remaining sinks from receiving the record.
///
/// # Example
///
/// ```
/// use shared::fields;
/// use shared::models::LogLevel;
/// use shared::telemetry::sinks::RingBufferSink;
/// use shared::telemetry::StructuredLogger;
/// use std::sync::Arc;
///
/// let ring = Arc::new(RingBufferSink::new(10));
/// let logger = StructuredLogger::new().with_sink(ring.clone());
///
/// logger.log(LogLevel::Info, "Home page accessed", fields! { "route" => "/" });
/// assert_eq!(ring.len(), 1);
/// ```
pub struct StructuredLogger {
    sinks: Vec<Arc<dyn LogSink>>,
    min_level: LogLevel,
    registry: Option<Arc<MetricRegistry>>,
    failures: AtomicU64,
}

impl StructuredLogger {
    /// Creates a logger with no sinks that accepts every level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            min_level: LogLevel::Debug,
            registry: None,
            failures: AtomicU64::new(0),
        }
    }

    /// Adds a sink. Sinks receive records in the order they were added.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Drops records below `level` before they reach any sink.
    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Counts emitted records and sink failures in `registry`.
    ///
    /// The registry must have the standard counters declared (see
    /// [`super::declare_standard_metrics`]).
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<MetricRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Returns the number of sinks.
    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Returns how many sink deliveries have failed so far.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Builds a record stamped with the current time and delivers it to
    /// every sink.
    ///
    /// Credentials in `key=value` form are masked in the message.
    pub fn log(&self, level: LogLevel, message: &str, fields: Fields) {
        if level < self.min_level {
            return;
        }

        let record = LogRecord::new(level, redact(message)).with_fields(fields);
        self.emit(&record);
    }

    /// Delivers an already-built record to every sink.
    pub fn emit(&self, record: &LogRecord) {
        if record.level < self.min_level {
            return;
        }

        for sink in &self.sinks {
            if let Err(e) = sink.accept(record) {
                self.failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(sink = sink.name(), error = %e, "Log sink delivery failed");
                self.count(ERRORS_TOTAL, "sink_failure");
            }
        }

        self.count(LOGS_GENERATED_TOTAL, level_label(record.level));
    }

    /// Logs at debug level.
    pub fn debug(&self, message: &str, fields: Fields) {
        self.log(LogLevel::Debug, message, fields);
    }

    /// Logs at info level.
    pub fn info(&self, message: &str, fields: Fields) {
        self.log(LogLevel::Info, message, fields);
    }

    /// Logs at warn level.
    pub fn warn(&self, message: &str, fields: Fields) {
        self.log(LogLevel::Warn, message, fields);
    }

    /// Logs at error level.
    pub fn error(&self, message: &str, fields: Fields) {
        self.log(LogLevel::Error, message, fields);
    }

    fn count(&self, name: &str, label: &str) {
        if let Some(registry) = &self.registry {
            if let Err(e) = registry.increment(name, &[label]) {
                tracing::error!(metric = name, error = %e, "Logger metric misuse");
            }
        }
    }
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StructuredLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuredLogger")
            .field("sinks", &self.sinks.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("min_level", &self.min_level)
            .field("failures", &self.failures())
            .finish_non_exhaustive()
    }
}

fn level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
