//! Application state module.
//!
//! Defines the shared application state that is passed to route handlers,
//! the request instrumentor and the chaos generator.

use crate::config::Config;
use anyhow::{Context, Result};
use shared::system::SystemProbe;
use shared::telemetry::sinks::{
    ConsoleSink, FileSink, LogSink, RemoteIndexConfig, RemoteIndexSink, RingBufferSink,
};
use shared::telemetry::{declare_standard_metrics, MetricRegistry, StructuredLogger};
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all request handlers.
///
/// Cloning is cheap; every clone shares the same registry, logger and ring
/// buffer.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<MetricRegistry>,
    logger: Arc<StructuredLogger>,
    recent_logs: Arc<RingBufferSink>,
    probe: Arc<SystemProbe>,
    service_name: Arc<str>,
    slow_delay: Duration,
}

impl AppState {
    /// Builds the state described by `config`: declares the standard
    /// counters and wires the ring, console, file and (optionally) remote
    /// index sinks.
    ///
    /// Must be called from within a Tokio runtime when a log file or remote
    /// index is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the counters cannot be declared or the log file
    /// cannot be opened.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = MetricRegistry::new_shared();
        declare_standard_metrics(&registry).context("Failed to declare standard metrics")?;

        let recent_logs = Arc::new(RingBufferSink::new(config.log_buffer_size));
        let mut sinks: Vec<Arc<dyn LogSink>> = vec![recent_logs.clone(), Arc::new(ConsoleSink)];

        if let Some(path) = &config.log_file {
            let file = FileSink::open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            sinks.push(Arc::new(file));
        }

        if let Some(url) = &config.elasticsearch_url {
            let remote = RemoteIndexConfig {
                index_prefix: config.index_prefix.clone(),
                ..RemoteIndexConfig::new(url.clone())
            };
            sinks.push(Arc::new(RemoteIndexSink::spawn(
                remote,
                Some(Arc::clone(&registry)),
            )));
        }

        let logger = sinks
            .into_iter()
            .fold(StructuredLogger::new(), StructuredLogger::with_sink)
            .with_min_level(config.log_level)
            .with_registry(Arc::clone(&registry));

        Ok(Self::new(
            registry,
            Arc::new(logger),
            recent_logs,
            &config.service_name,
            config.slow_delay,
        ))
    }

    /// Creates state from already-built parts.
    ///
    /// `recent_logs` should also be one of the logger's sinks, otherwise
    /// snapshots stay empty.
    #[must_use]
    pub fn new(
        registry: Arc<MetricRegistry>,
        logger: Arc<StructuredLogger>,
        recent_logs: Arc<RingBufferSink>,
        service_name: &str,
        slow_delay: Duration,
    ) -> Self {
        Self {
            registry,
            logger,
            recent_logs,
            probe: Arc::new(SystemProbe::new()),
            service_name: Arc::from(service_name),
            slow_delay,
        }
    }

    /// Creates state whose only sink is an in-memory ring buffer of the
    /// given capacity.
    ///
    /// This is useful for development and testing.
    ///
    /// # Panics
    ///
    /// Never in practice: the standard counters are declared on a fresh registry.
    #[must_use]
    pub fn in_memory(ring_capacity: usize) -> Self {
        let registry = MetricRegistry::new_shared();
        declare_standard_metrics(&registry).expect("fresh registry accepts standard metrics");

        let recent_logs = Arc::new(RingBufferSink::new(ring_capacity));
        let logger = StructuredLogger::new()
            .with_sink(recent_logs.clone())
            .with_registry(Arc::clone(&registry));

        Self::new(
            registry,
            Arc::new(logger),
            recent_logs,
            "vigil",
            Duration::from_millis(50),
        )
    }

    /// Returns the counter registry.
    #[must_use]
    pub fn registry(&self) -> &MetricRegistry {
        self.registry.as_ref()
    }

    /// Returns the structured logger.
    #[must_use]
    pub fn logger(&self) -> &StructuredLogger {
        self.logger.as_ref()
    }

    /// Returns the ring buffer feeding dashboard snapshots.
    #[must_use]
    pub fn recent_logs(&self) -> &RingBufferSink {
        self.recent_logs.as_ref()
    }

    /// Returns the resource probe.
    #[must_use]
    pub fn probe(&self) -> &SystemProbe {
        self.probe.as_ref()
    }

    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Returns the delay applied by the slow demo endpoint.
    #[must_use]
    pub fn slow_delay(&self) -> Duration {
        self.slow_delay
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::in_memory(shared::telemetry::sinks::ring::DEFAULT_RING_CAPACITY)
    }
}
