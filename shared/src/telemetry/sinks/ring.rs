//! In-memory ring buffer sink.

use super::{LogSink, SinkError};
use crate::models::LogRecord;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of records kept for snapshots.
pub const DEFAULT_RING_CAPACITY: usize = 50;

/// Keeps the most recent records in memory, evicting the oldest on overflow.
///
/// The buffer feeds the dashboard snapshot. Writers hold the lock only for
/// the push; readers only for the copy.
///
/// # Example
///
/// ```
/// use shared::models::{LogLevel, LogRecord};
/// use shared::telemetry::sinks::{LogSink, RingBufferSink};
///
/// let ring = RingBufferSink::new(2);
/// for msg in ["one", "two", "three"] {
///     ring.accept(&LogRecord::new(LogLevel::Info, msg)).unwrap();
/// }
///
/// let messages: Vec<_> = ring.records().into_iter().map(|r| r.message).collect();
/// assert_eq!(messages, vec!["two", "three"]);
/// ```
#[derive(Debug)]
pub struct RingBufferSink {
    capacity: usize,
    records: Mutex<VecDeque<LogRecord>>,
}

impl RingBufferSink {
    /// Creates a ring buffer holding at most `capacity` records.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of buffered records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |r| r.len())
    }

    /// Returns true if nothing has been buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the buffered records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Formats the buffered records as dashboard lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records
            .lock()
            .map(|r| r.iter().map(LogRecord::to_line).collect())
            .unwrap_or_default()
    }
}

impl Default for RingBufferSink {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY)
    }
}

impl LogSink for RingBufferSink {
    fn name(&self) -> &str {
        "ring"
    }

    fn accept(&self, record: &LogRecord) -> Result<(), SinkError> {
        let mut records = self.records.lock().map_err(|_| SinkError::LockPoisoned)?;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        Ok(())
    }
}
