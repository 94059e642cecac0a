//! Remote search-index sink.
//!
//! Ships records to an Elasticsearch-compatible HTTP endpoint. `accept` only
//! enqueues; a background task owns the HTTP client and does the delivery,
//! so a slow or unreachable index never adds latency to the caller.

use super::{LogSink, SinkError};
use crate::models::{Fields, LogRecord};
use crate::telemetry::{MetricRegistry, ERRORS_TOTAL};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Configuration for the remote index sink.
#[derive(Debug, Clone)]
pub struct RemoteIndexConfig {
    /// Base URL of the index (e.g. `http://elasticsearch:9200`).
    pub url: String,
    /// Index name prefix; records go to `<prefix>-YYYY.MM.DD`.
    pub index_prefix: String,
    /// Maximum number of records waiting for delivery.
    pub queue_capacity: usize,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl RemoteIndexConfig {
    /// Creates a configuration with default queue size and timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Returns the document URL for a record emitted at `timestamp`.
    #[must_use]
    pub fn document_url(&self, timestamp: DateTime<Utc>) -> String {
        format!(
            "{}/{}-{}/_doc",
            self.url.trim_end_matches('/'),
            self.index_prefix,
            timestamp.format("%Y.%m.%d")
        )
    }
}

impl Default for RemoteIndexConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index_prefix: "logs".to_string(),
            queue_capacity: 1024,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Indexed document shape.
#[derive(Debug, Serialize)]
struct IndexDocument<'a> {
    #[serde(rename = "@timestamp")]
    timestamp: DateTime<Utc>,
    severity: String,
    message: &'a str,
    fields: &'a Fields,
}

impl<'a> From<&'a LogRecord> for IndexDocument<'a> {
    fn from(record: &'a LogRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            severity: record.level.to_string(),
            message: &record.message,
            fields: &record.fields,
        }
    }
}

/// Queued sink delivering records to a search index.
#[derive(Debug)]
pub struct RemoteIndexSink {
    tx: mpsc::Sender<LogRecord>,
    failures: Arc<AtomicU64>,
}

impl RemoteIndexSink {
    /// Starts the delivery task and returns the sink.
    ///
    /// Failed deliveries are counted, logged with `tracing`, and, when a
    /// registry is given, recorded as `errors_total{type="sink_failure"}`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(config: RemoteIndexConfig, registry: Option<Arc<MetricRegistry>>) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let failures = Arc::new(AtomicU64::new(0));

        tokio::spawn(deliver(config, rx, Arc::clone(&failures), registry));

        Self { tx, failures }
    }

    /// Returns the number of records that failed asynchronous delivery.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl LogSink for RemoteIndexSink {
    fn name(&self) -> &str {
        "remote-index"
    }

    fn accept(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.tx.try_send(record.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}

async fn deliver(
    config: RemoteIndexConfig,
    mut rx: mpsc::Receiver<LogRecord>,
    failures: Arc<AtomicU64>,
    registry: Option<Arc<MetricRegistry>>,
) {
    let client = match reqwest::Client::builder().timeout(config.timeout).build() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build remote index client, sink disabled");
            return;
        }
    };

    while let Some(record) = rx.recv().await {
        let url = config.document_url(record.timestamp);
        let result = client
            .post(&url)
            .json(&IndexDocument::from(&record))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        if let Err(e) = result {
            tracing::warn!(error = %e, %url, "Remote index delivery failed");
            if let Some(registry) = &registry {
                if let Err(e) = registry.increment(ERRORS_TOTAL, &["sink_failure"]) {
                    tracing::error!(error = %e, "Failed to count sink failure");
                }
            }
            failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    tracing::debug!("Remote index delivery task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogLevel;
    use chrono::TimeZone;

    fn unreachable_config() -> RemoteIndexConfig {
        RemoteIndexConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(500),
            ..RemoteIndexConfig::default()
        }
    }

    #[test]
    fn test_document_url_uses_daily_index() {
        let config = RemoteIndexConfig::new("http://es:9200/");
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 8, 0, 0).unwrap();

        assert_eq!(config.document_url(ts), "http://es:9200/logs-2024.03.07/_doc");
    }

    #[test]
    fn test_index_document_shape() {
        let record = LogRecord::new(LogLevel::Warn, "slow").with_field("ms", 3000);
        let value = serde_json::to_value(IndexDocument::from(&record)).unwrap();

        assert_eq!(value["severity"], "warn");
        assert_eq!(value["message"], "slow");
        assert_eq!(value["fields"]["ms"], 3000);
        assert!(value["@timestamp"].is_string());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_accept_reports_full_queue() {
        let config = RemoteIndexConfig {
            queue_capacity: 1,
            ..unreachable_config()
        };
        let sink = RemoteIndexSink::spawn(config, None);
        let record = LogRecord::new(LogLevel::Info, "queued");

        // The delivery task cannot run until this task yields.
        assert!(sink.accept(&record).is_ok());
        assert!(matches!(sink.accept(&record), Err(SinkError::QueueFull)));
    }

    #[tokio::test]
    async fn test_unreachable_index_counts_failure() {
        let registry = MetricRegistry::new_shared();
        crate::telemetry::declare_standard_metrics(&registry).unwrap();
        let sink = RemoteIndexSink::spawn(unreachable_config(), Some(Arc::clone(&registry)));

        sink.accept(&LogRecord::new(LogLevel::Error, "lost"))
            .unwrap();

        for _ in 0..100 {
            if sink.failures() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(sink.failures(), 1);
        assert_eq!(registry.get(ERRORS_TOTAL, &["sink_failure"]).unwrap(), 1);
    }
}
