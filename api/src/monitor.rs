//! Background system monitor.
//!
//! Samples host CPU and memory on a fixed interval, refreshes the host
//! gauges and logs one line per sample so the dashboard table keeps moving
//! even when nobody is sending requests.

use crate::config::MonitorConfig;
use crate::state::AppState;
use shared::fields;
use shared::models::SystemMetrics;
use shared::telemetry::{SYSTEM_CPU_USAGE, SYSTEM_MEMORY_USAGE};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// CPU usage above which a sample is logged as high load.
pub const HIGH_CPU_PERCENT: f64 = 50.0;

/// Memory usage above which a sample is logged as critical.
pub const CRITICAL_MEMORY_PERCENT: f64 = 80.0;

/// Shortest accepted time between samples.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What one sample looked like. CPU is checked before memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// CPU above [`HIGH_CPU_PERCENT`].
    HighCpu {
        /// CPU usage in percent.
        cpu: f64,
    },
    /// Memory above [`CRITICAL_MEMORY_PERCENT`].
    MemoryCritical {
        /// Memory usage in percent.
        memory: f64,
    },
    /// Neither threshold crossed.
    Stable {
        /// CPU usage in percent.
        cpu: f64,
        /// Memory usage in percent.
        memory: f64,
    },
}

impl Observation {
    /// Classifies one reading.
    #[must_use]
    pub fn classify(metrics: &SystemMetrics) -> Self {
        let cpu = metrics.cpu;
        let memory = metrics.memory.percent;
        if cpu > HIGH_CPU_PERCENT {
            Self::HighCpu { cpu }
        } else if memory > CRITICAL_MEMORY_PERCENT {
            Self::MemoryCritical { memory }
        } else {
            Self::Stable { cpu, memory }
        }
    }
}

/// Periodic host sampler.
pub struct SystemMonitor {
    state: AppState,
    interval: Duration,
}

impl SystemMonitor {
    /// Creates a monitor; the interval is raised to at least [`MIN_INTERVAL`].
    #[must_use]
    pub fn new(state: AppState, config: &MonitorConfig) -> Self {
        Self {
            state,
            interval: config.interval.max(MIN_INTERVAL),
        }
    }

    /// Logs one observation.
    pub fn record(&self, observation: Observation) {
        let logger = self.state.logger();
        match observation {
            Observation::HighCpu { cpu } => logger.warn(
                &format!("High CPU Load: {cpu:.1}%"),
                fields! { "cpu" => cpu },
            ),
            Observation::MemoryCritical { memory } => logger.warn(
                &format!("Memory Critical: {memory:.1}%"),
                fields! { "memory" => memory },
            ),
            Observation::Stable { cpu, memory } => logger.info(
                &format!("System Stable: CPU {cpu:.1}% - RAM {memory:.1}%"),
                fields! { "cpu" => cpu, "memory" => memory },
            ),
        }
    }

    /// Takes one sample: refreshes the host gauges, then logs it.
    pub fn sample(&self) -> Observation {
        let metrics = self.state.probe().system_metrics();
        let registry = self.state.registry();
        if let Err(e) = registry
            .set_gauge(SYSTEM_CPU_USAGE, metrics.cpu)
            .and_then(|()| registry.set_gauge(SYSTEM_MEMORY_USAGE, metrics.memory.percent))
        {
            tracing::error!(error = %e, "Failed to update host gauges");
        }

        let observation = Observation::classify(&metrics);
        self.record(observation);
        observation
    }

    /// Starts the sampling loop.
    ///
    /// The first sample is taken one full interval after start. This function
    /// runs until cancelled via the task handle.
    pub async fn run(self: Arc<Self>) {
        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tick.tick().await;

        loop {
            tick.tick().await;
            let observation = self.sample();
            tracing::debug!(?observation, "System sample taken");
        }
    }

    /// Spawns the monitor on the current runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(Arc::new(self).run())
    }
}
