//! Chaos generator.
//!
//! A background task that, on a fixed interval, randomly injects synthetic
//! error and warning events into the telemetry pipeline so dashboards and
//! alerts always have non-zero, non-deterministic data to show.

use crate::config::ChaosConfig;
use crate::state::AppState;
use chrono::Utc;
use rand::Rng;
use shared::fields;
use shared::system::ProcessMetrics;
use shared::telemetry::ERRORS_TOTAL;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Shortest accepted time between ticks.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// A synthetic event produced by one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ChaosEvent {
    /// A random error, counted as `errors_total{type="random_error"}`.
    RandomError,
    /// A high memory usage warning carrying the current process memory.
    HighMemoryWarning {
        /// Process resource usage at the time of the tick.
        memory: ProcessMetrics,
    },
}

/// Periodic chaos event generator.
pub struct ChaosGenerator {
    state: AppState,
    config: ChaosConfig,
}

impl ChaosGenerator {
    /// Creates a new chaos generator.
    ///
    /// Probabilities outside `0.0..=1.0` are clamped and the interval is
    /// raised to at least [`MIN_INTERVAL`].
    #[must_use]
    pub fn new(state: AppState, config: ChaosConfig) -> Self {
        let config = ChaosConfig {
            interval: config.interval.max(MIN_INTERVAL),
            error_probability: clamp_probability(config.error_probability),
            warning_probability: clamp_probability(config.warning_probability),
            ..config
        };
        Self { state, config }
    }

    /// Decides which events fire this tick. The two checks are independent.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> Vec<ChaosEvent> {
        let mut events = Vec::new();
        if rng.gen_bool(self.config.error_probability) {
            events.push(ChaosEvent::RandomError);
        }
        if rng.gen_bool(self.config.warning_probability) {
            events.push(ChaosEvent::HighMemoryWarning {
                memory: self.state.probe().process_metrics(),
            });
        }
        events
    }

    /// Emits one event into the logger and registry.
    pub fn emit(&self, event: &ChaosEvent) {
        let service = self.state.service_name();
        match event {
            ChaosEvent::RandomError => {
                self.state.logger().error(
                    "Random simulated error occurred",
                    fields! {
                        "service" => service,
                        "timestamp" => Utc::now().to_rfc3339(),
                    },
                );
                if let Err(e) = self
                    .state
                    .registry()
                    .increment(ERRORS_TOTAL, &["random_error"])
                {
                    tracing::error!(error = %e, "Failed to count random error");
                }
            }
            ChaosEvent::HighMemoryWarning { memory } => {
                self.state.logger().warn(
                    "High memory usage warning",
                    fields! {
                        "service" => service,
                        "memoryUsage" => memory,
                    },
                );
            }
        }
    }

    /// Runs one tick: rolls for events and emits every one that fires.
    pub fn tick<R: Rng>(&self, rng: &mut R) -> Vec<ChaosEvent> {
        let events = self.roll(rng);
        for event in &events {
            self.emit(event);
        }
        events
    }

    /// Starts the generator loop.
    ///
    /// The first tick happens one full interval after start. This function
    /// runs until cancelled via the task handle.
    pub async fn run(self: Arc<Self>) {
        let mut tick = interval(self.config.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tick.tick().await;

        loop {
            tick.tick().await;
            let events = self.tick(&mut rand::thread_rng());
            if !events.is_empty() {
                tracing::debug!(count = events.len(), "Chaos events emitted");
            }
        }
    }

    /// Spawns the generator on the current runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(Arc::new(self).run())
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
