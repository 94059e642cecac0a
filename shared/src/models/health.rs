//! Coarse health grading from CPU and memory load.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall host health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Score below 40.
    #[default]
    Good,
    /// Score below 75.
    Moderate,
    /// Anything higher.
    Critical,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "GOOD"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Result of [`analyze_health`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthReport {
    /// Weighted load, 0–100.
    pub score: f64,
    /// Grade derived from the score.
    pub status: HealthStatus,
}

/// Grades the host: equal weight to CPU and memory percentages.
#[must_use]
pub fn analyze_health(cpu: f64, memory: f64) -> HealthReport {
    let score = 0.5 * cpu + 0.5 * memory;
    let status = if score < 40.0 {
        HealthStatus::Good
    } else if score < 75.0 {
        HealthStatus::Moderate
    } else {
        HealthStatus::Critical
    };

    HealthReport { score, status }
}
