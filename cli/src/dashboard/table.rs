//! Recent-log table built from snapshot lines.

use std::fmt;

/// Maximum rows shown in the table.
pub const MAX_ROWS: usize = 8;

const DELIMITER: &str = " | ";

/// Visual category of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Default category.
    Info,
    /// `WARNING` lines.
    Warning,
    /// `SUCCESS` lines.
    Success,
}

impl Category {
    /// Maps a level label to its category.
    #[must_use]
    pub fn from_level(level: &str) -> Self {
        match level {
            "WARNING" => Self::Warning,
            "SUCCESS" => Self::Success,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    /// Time column.
    pub time: String,
    /// Level label as sent by the server.
    pub level: String,
    /// Message column; may itself contain the delimiter.
    pub message: String,
    /// Category derived from the level.
    pub category: Category,
}

/// Parses `time | LEVEL | message`. Lines with fewer than three parts yield `None`.
#[must_use]
pub fn parse_line(line: &str) -> Option<LogRow> {
    let mut parts = line.splitn(3, DELIMITER);
    let time = parts.next()?;
    let level = parts.next()?;
    let message = parts.next()?;

    Some(LogRow {
        time: time.to_string(),
        level: level.to_string(),
        message: message.to_string(),
        category: Category::from_level(level),
    })
}

/// Builds the table: newest first, at most [`MAX_ROWS`] lines considered.
#[must_use]
pub fn build_rows(lines: &[String]) -> Vec<LogRow> {
    lines
        .iter()
        .rev()
        .take(MAX_ROWS)
        .filter_map(|line| parse_line(line))
        .collect()
}
