//! Console sink.
//!
//! Forwards records into `tracing`, so they are printed by whatever
//! subscriber the process installed (pretty or JSON).

use super::{LogSink, SinkError};
use crate::models::{LogLevel, LogRecord};

/// Sink that re-emits records as `tracing` events under the `vigil::log` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn accept(&self, record: &LogRecord) -> Result<(), SinkError> {
        let fields = serde_json::to_string(&record.fields)?;
        let timestamp = record.timestamp.to_rfc3339();
        let message = record.message.as_str();

        match record.level {
            LogLevel::Debug => {
                tracing::debug!(target: "vigil::log", %timestamp, %fields, "{message}");
            }
            LogLevel::Info => {
                tracing::info!(target: "vigil::log", %timestamp, %fields, "{message}");
            }
            LogLevel::Warn => {
                tracing::warn!(target: "vigil::log", %timestamp, %fields, "{message}");
            }
            LogLevel::Error => {
                tracing::error!(target: "vigil::log", %timestamp, %fields, "{message}");
            }
        }
        Ok(())
    }
}
