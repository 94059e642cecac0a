//! Snapshot data model.
//!
//! The snapshot is the JSON document served to the dashboard: current host
//! metrics, the most recent formatted log lines and a health grade.

use super::health::{analyze_health, HealthStatus};
use serde::{Deserialize, Serialize};

/// A percentage reading, `0.0..=100.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Usage in percent.
    pub percent: f64,
}

impl Usage {
    /// Creates a usage reading clamped to `0.0..=100.0`.
    #[must_use]
    pub fn new(percent: f64) -> Self {
        Self {
            percent: clamp_percent(percent),
        }
    }
}

/// Host-level metrics included in every snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Global CPU usage in percent.
    pub cpu: f64,
    /// Memory usage.
    pub memory: Usage,
    /// Root disk usage.
    #[serde(default)]
    pub disk: Usage,
    /// Seconds since the host booted.
    #[serde(default)]
    pub uptime: u64,
}

/// Point-in-time projection of metrics and recent logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Host metrics.
    pub metrics: SystemMetrics,
    /// Recent log lines, oldest first.
    #[serde(default)]
    pub logs: Vec<String>,
    /// Health grade derived from the CPU and memory readings.
    #[serde(default)]
    pub ai_status: HealthStatus,
}

impl Snapshot {
    /// Builds a snapshot, grading health from `metrics`.
    #[must_use]
    pub fn new(metrics: SystemMetrics, logs: Vec<String>) -> Self {
        let ai_status = analyze_health(metrics.cpu, metrics.memory.percent).status;
        Self {
            metrics,
            logs,
            ai_status,
        }
    }
}

pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serialization_shape() {
        let snapshot = Snapshot::new(
            SystemMetrics {
                cpu: 12.5,
                memory: Usage::new(40.0),
                disk: Usage::new(70.0),
                uptime: 3600,
            },
            vec!["12:00:01 | INFO | ready".to_string()],
        );

        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["metrics"]["cpu"], 12.5);
        assert_eq!(value["metrics"]["memory"]["percent"], 40.0);
        assert_eq!(value["metrics"]["disk"]["percent"], 70.0);
        assert_eq!(value["logs"][0], "12:00:01 | INFO | ready");
        assert_eq!(value["ai_status"], "GOOD");
    }

    #[test]
    fn test_snapshot_grades_health_from_metrics() {
        let metrics = SystemMetrics {
            cpu: 95.0,
            memory: Usage::new(90.0),
            ..SystemMetrics::default()
        };

        assert_eq!(
            Snapshot::new(metrics, Vec::new()).ai_status,
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_snapshot_deserialization_tolerates_missing_optional_fields() {
        let json = r#"{"metrics": {"cpu": 3.0, "memory": {"percent": 55.5}}}"#;

        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        assert!((snapshot.metrics.cpu - 3.0).abs() < f64::EPSILON);
        assert!((snapshot.metrics.memory.percent - 55.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.metrics.uptime, 0);
        assert!(snapshot.logs.is_empty());
        assert_eq!(snapshot.ai_status, HealthStatus::Good);
    }

    #[test]
    fn test_usage_is_clamped() {
        assert!((Usage::new(140.0).percent - 100.0).abs() < f64::EPSILON);
        assert!(Usage::new(-3.0).percent.abs() < f64::EPSILON);
        assert!(Usage::new(f64::NAN).percent.abs() < f64::EPSILON);
    }
}
