//! Log sinks.
//!
//! A sink is any delivery target for log records. The logger owns a fixed,
//! ordered collection of sinks and hands every record to each one; what a
//! sink does with it (buffer it, append it to a file, ship it to an index)
//! and how reliable that is, is the sink's own business.

pub mod console;
pub mod file;
pub mod remote;
pub mod ring;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use remote::{RemoteIndexConfig, RemoteIndexSink};
pub use ring::RingBufferSink;

use crate::models::LogRecord;
use thiserror::Error;

/// Errors a sink can report when it cannot accept a record.
#[derive(Debug, Error)]
pub enum SinkError {
    /// I/O failure (file sinks).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The sink's delivery queue is full.
    #[error("Sink queue is full")]
    QueueFull,

    /// The sink's delivery worker has stopped.
    #[error("Sink is closed")]
    Closed,

    /// A remote backend rejected or failed the delivery.
    #[error("Remote delivery failed: {0}")]
    Remote(String),

    /// Failed to acquire a lock inside the sink.
    #[error("Failed to acquire lock on sink")]
    LockPoisoned,
}

/// A delivery target for log records.
///
/// Implementations must be thread-safe (Send + Sync) and must not block the
/// caller for longer than it takes to hand the record off.
pub trait LogSink: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    /// Accepts one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink could not take the record.
    fn accept(&self, record: &LogRecord) -> Result<(), SinkError>;
}
