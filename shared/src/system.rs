//! Host and process resource probe.
//!
//! Wraps `sysinfo` behind a lock so request handlers and background tasks
//! can sample CPU, memory and disk usage concurrently.

use crate::models::snapshot::clamp_percent;
use crate::models::{SystemMetrics, Usage};
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use sysinfo::{Disks, Pid, System};

/// Resource usage of the current process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessMetrics {
    /// Resident set size in bytes.
    pub rss_bytes: u64,
    /// Virtual memory size in bytes.
    pub virtual_bytes: u64,
    /// CPU usage in percent since the previous sample.
    pub cpu_percent: f64,
    /// Seconds since the probe was created.
    pub uptime_secs: f64,
}

/// Samples host and process resource usage.
pub struct SystemProbe {
    system: Mutex<System>,
    disks: Mutex<Disks>,
    pid: Option<Pid>,
    started: Instant,
}

impl SystemProbe {
    /// Creates a probe and takes an initial CPU sample, so that the first
    /// real reading has a baseline to compare against.
    #[must_use]
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        let pid = sysinfo::get_current_pid().ok();
        if let Some(pid) = pid {
            system.refresh_process(pid);
        }

        Self {
            system: Mutex::new(system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            pid,
            started: Instant::now(),
        }
    }

    /// Samples host CPU, memory and root disk usage.
    ///
    /// A poisoned lock yields zeroed readings rather than an error; the probe
    /// only feeds dashboards.
    #[must_use]
    pub fn system_metrics(&self) -> SystemMetrics {
        let (cpu, memory) = self
            .system
            .lock()
            .map(|mut sys| {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    f64::from(sys.global_cpu_info().cpu_usage()),
                    percent_of(sys.used_memory(), sys.total_memory()),
                )
            })
            .unwrap_or_default();

        SystemMetrics {
            cpu: clamp_percent(cpu),
            memory: Usage::new(memory),
            disk: Usage::new(self.root_disk_percent()),
            uptime: System::uptime(),
        }
    }

    /// Samples the current process.
    #[must_use]
    pub fn process_metrics(&self) -> ProcessMetrics {
        let mut metrics = ProcessMetrics {
            uptime_secs: self.started.elapsed().as_secs_f64(),
            ..ProcessMetrics::default()
        };

        let (Some(pid), Ok(mut sys)) = (self.pid, self.system.lock()) else {
            return metrics;
        };
        sys.refresh_process(pid);
        if let Some(process) = sys.process(pid) {
            metrics.rss_bytes = process.memory();
            metrics.virtual_bytes = process.virtual_memory();
            metrics.cpu_percent = f64::from(process.cpu_usage());
        }
        metrics
    }

    fn root_disk_percent(&self) -> f64 {
        let Ok(mut disks) = self.disks.lock() else {
            return 0.0;
        };
        disks.refresh();
        disks
            .list()
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first())
            .map_or(0.0, |d| {
                percent_of(d.total_space().saturating_sub(d.available_space()), d.total_space())
            })
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SystemProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemProbe")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
