//! Snapshot polling loop.

use super::render::{Frame, Render};
use super::series::TimeSeriesBuffer;
use super::table::{build_rows, LogRow};
use crate::client::ApiClient;
use anyhow::Result;
use shared::models::{analyze_health, HealthReport, Snapshot};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Default delay between polls, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Shortest accepted delay between polls.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Where the dashboard gets its snapshots from.
pub trait SnapshotSource {
    /// Fetches the current snapshot.
    fn fetch(&self) -> impl Future<Output = Result<Snapshot>>;
}

impl SnapshotSource for ApiClient {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot>> {
        self.snapshot()
    }
}

/// Dashboard state fed by periodic snapshots.
#[derive(Debug)]
pub struct DashboardPoller<S = ApiClient> {
    source: S,
    cpu: TimeSeriesBuffer,
    memory: TimeSeriesBuffer,
    disk: f64,
    uptime: u64,
    rows: Vec<LogRow>,
}

impl<S: SnapshotSource> DashboardPoller<S> {
    /// Creates a poller with zero-filled windows of `window` samples.
    #[must_use]
    pub fn new(source: S, window: usize) -> Self {
        Self {
            source,
            cpu: TimeSeriesBuffer::new(window),
            memory: TimeSeriesBuffer::new(window),
            disk: 0.0,
            uptime: 0,
            rows: Vec::new(),
        }
    }

    /// Folds one snapshot into the charts and the log table.
    pub fn apply(&mut self, snapshot: &Snapshot) {
        self.cpu.push(snapshot.metrics.cpu);
        self.memory.push(snapshot.metrics.memory.percent);
        self.disk = snapshot.metrics.disk.percent;
        self.uptime = snapshot.metrics.uptime;
        self.rows = build_rows(&snapshot.logs);
    }

    /// Health grade of the most recent sample.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        analyze_health(self.cpu.latest(), self.memory.latest())
    }

    /// Current frame.
    #[must_use]
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            cpu: &self.cpu,
            memory: &self.memory,
            disk: self.disk,
            uptime: self.uptime,
            health: self.health(),
            rows: &self.rows,
        }
    }

    /// Fetches one snapshot and renders it.
    ///
    /// A failed fetch is logged and leaves the dashboard untouched.
    ///
    /// # Errors
    ///
    /// Returns an error only if rendering fails.
    pub async fn poll_once<R: Render>(&mut self, renderer: &mut R) -> Result<()> {
        match self.source.fetch().await {
            Ok(snapshot) => {
                self.apply(&snapshot);
                renderer.render(&self.frame())?;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch snapshot");
            }
        }
        Ok(())
    }

    /// Polls immediately, then once per `period`, until rendering fails.
    ///
    /// Each fetch is awaited before the next tick is taken, so polls never
    /// overlap. A zero `period` is raised to one millisecond.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub async fn run<R: Render>(&mut self, renderer: &mut R, period: Duration) -> Result<()> {
        let mut interval = tokio::time::interval(period.max(MIN_POLL_INTERVAL));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // First tick completes immediately
            interval.tick().await;
            self.poll_once(renderer).await?;
        }
    }
}
