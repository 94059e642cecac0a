//! Log record data model.
//!
//! Defines the `LogRecord` structure emitted by the structured logger and
//! handed to every sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Log severity level.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Debug information.
    Debug,
    /// Informational messages.
    #[default]
    Info,
    /// Warning conditions.
    Warn,
    /// Error conditions.
    Error,
}

impl LogLevel {
    /// Returns the upper-case label used in formatted log lines.
    ///
    /// Warnings are spelled out as `WARNING`, which is what the dashboard
    /// keys its badge colours on.
    #[must_use]
    pub fn line_label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARNING",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Error returned when a string does not name a log level.
#[derive(Debug, Error)]
#[error("Unknown log level: {0}")]
pub struct ParseLogLevelError(String);

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

/// A single structured log event.
///
/// Records are immutable once built; the logger hands the same record to
/// every sink by reference.
///
/// # Example
///
/// ```
/// use shared::models::{LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Info, "HTTP Request")
///     .with_field("method", "GET")
///     .with_field("status", 200);
///
/// assert_eq!(record.fields.len(), 2);
/// assert_eq!(record.level, LogLevel::Info);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Timestamp when the record was emitted.
    pub timestamp: DateTime<Utc>,

    /// Severity level of the record.
    #[serde(default)]
    pub level: LogLevel,

    /// The log message.
    pub message: String,

    /// Structured key-value fields.
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Creates a new record stamped with the current time.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a structured field to the record.
    ///
    /// Values that fail to serialize are stored as `null`.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.fields.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }

    /// Adds every entry of `fields` to the record.
    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Formats the record as a dashboard line: `HH:MM:SS | LEVEL | message`.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} | {} | {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.line_label(),
            self.message
        )
    }
}

/// Structured fields attached to a log record.
pub type Fields = BTreeMap<String, serde_json::Value>;

/// Builds a [`Fields`] map from `key => value` pairs.
///
/// ```
/// let fields = shared::fields! { "service" => "api", "attempt" => 3 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => { $crate::models::Fields::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::models::Fields::new();
        $(
            map.insert(
                ::std::string::String::from($key),
                $crate::serde_json::to_value($value).unwrap_or($crate::serde_json::Value::Null),
            );
        )+
        map
    }};
}
