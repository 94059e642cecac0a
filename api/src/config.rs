//! Server configuration module.
//!
//! Handles loading configuration from environment variables with sensible defaults.

use anyhow::{bail, Context, Result};
use shared::models::LogLevel;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Chaos generator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaosConfig {
    /// Whether the generator runs at all.
    pub enabled: bool,
    /// Time between ticks.
    pub interval: Duration,
    /// Probability of a random error per tick.
    pub error_probability: f64,
    /// Probability of a high-memory warning per tick.
    pub warning_probability: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(30),
            error_probability: 0.1,
            warning_probability: 0.3,
        }
    }
}

/// System monitor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Whether the monitor runs at all.
    pub enabled: bool,
    /// Time between samples.
    pub interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5),
        }
    }
}

/// Server configuration.
///
/// Configuration values can be set via environment variables:
/// - `VIGIL_HOST`: The host address to bind to (default: "0.0.0.0")
/// - `VIGIL_PORT`: The port to listen on (default: 3001)
/// - `VIGIL_SERVICE_NAME`: Service name stamped on synthetic events (default: "vigil")
/// - `VIGIL_LOG_LEVEL`: Minimum structured log level (default: "info")
/// - `VIGIL_LOG_FILE`: JSON-lines log file; empty disables the file sink (default: "logs/app.log")
/// - `VIGIL_LOG_BUFFER_SIZE`: Records kept for dashboard snapshots (default: 50)
/// - `VIGIL_ELASTICSEARCH_URL`: Search index URL; unset disables the remote sink
/// - `VIGIL_INDEX_PREFIX`: Index name prefix (default: "logs")
/// - `VIGIL_CHAOS_ENABLED`: Run the chaos generator (default: true)
/// - `VIGIL_CHAOS_INTERVAL_SECS`: Seconds between chaos ticks (default: 30)
/// - `VIGIL_CHAOS_ERROR_PROBABILITY`: Random error chance per tick (default: 0.1)
/// - `VIGIL_CHAOS_WARNING_PROBABILITY`: Memory warning chance per tick (default: 0.3)
/// - `VIGIL_MONITOR_ENABLED`: Run the system monitor (default: true)
/// - `VIGIL_MONITOR_INTERVAL_SECS`: Seconds between monitor samples (default: 5)
/// - `VIGIL_SLOW_DELAY_MS`: Artificial delay of the slow endpoint (default: 3000)
#[derive(Debug, Clone)]
pub struct Config {
    /// The host address to bind to.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
    /// Service name.
    pub service_name: String,
    /// Minimum structured log level.
    pub log_level: LogLevel,
    /// Path of the JSON-lines log file, if enabled.
    pub log_file: Option<PathBuf>,
    /// Number of records kept for snapshots.
    pub log_buffer_size: usize,
    /// Search index URL, if the remote sink is enabled.
    pub elasticsearch_url: Option<String>,
    /// Search index name prefix.
    pub index_prefix: String,
    /// Chaos generator settings.
    pub chaos: ChaosConfig,
    /// System monitor settings.
    pub monitor: MonitorConfig,
    /// Delay applied by the slow demo endpoint.
    pub slow_delay: Duration,
}

impl Config {
    /// Creates a new configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set but cannot be parsed, or if
    /// the resulting configuration fails [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = var("VIGIL_HOST").unwrap_or(defaults.host);
        let port = parse_var(&var, "VIGIL_PORT")?.unwrap_or(defaults.port);
        let service_name = var("VIGIL_SERVICE_NAME").unwrap_or(defaults.service_name);
        let log_level = parse_var(&var, "VIGIL_LOG_LEVEL")?.unwrap_or(defaults.log_level);
        let log_file = match var("VIGIL_LOG_FILE") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => defaults.log_file,
        };
        let log_buffer_size =
            parse_var(&var, "VIGIL_LOG_BUFFER_SIZE")?.unwrap_or(defaults.log_buffer_size);
        let elasticsearch_url = var("VIGIL_ELASTICSEARCH_URL").filter(|url| !url.trim().is_empty());
        let index_prefix = var("VIGIL_INDEX_PREFIX").unwrap_or(defaults.index_prefix);

        let chaos = ChaosConfig {
            enabled: parse_var(&var, "VIGIL_CHAOS_ENABLED")?.unwrap_or(defaults.chaos.enabled),
            interval: parse_var(&var, "VIGIL_CHAOS_INTERVAL_SECS")?
                .map_or(defaults.chaos.interval, Duration::from_secs),
            error_probability: parse_var(&var, "VIGIL_CHAOS_ERROR_PROBABILITY")?
                .unwrap_or(defaults.chaos.error_probability),
            warning_probability: parse_var(&var, "VIGIL_CHAOS_WARNING_PROBABILITY")?
                .unwrap_or(defaults.chaos.warning_probability),
        };

        let monitor = MonitorConfig {
            enabled: parse_var(&var, "VIGIL_MONITOR_ENABLED")?.unwrap_or(defaults.monitor.enabled),
            interval: parse_var(&var, "VIGIL_MONITOR_INTERVAL_SECS")?
                .map_or(defaults.monitor.interval, Duration::from_secs),
        };

        let slow_delay = parse_var(&var, "VIGIL_SLOW_DELAY_MS")?
            .map_or(defaults.slow_delay, Duration::from_millis);

        let config = Self {
            host,
            port,
            service_name,
            log_level,
            log_file,
            log_buffer_size,
            elasticsearch_url,
            index_prefix,
            chaos,
            monitor,
            slow_delay,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is invalid or a background
    /// interval is zero.
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.chaos.interval.is_zero() {
            bail!("VIGIL_CHAOS_INTERVAL_SECS must be at least 1");
        }
        if self.monitor.interval.is_zero() {
            bail!("VIGIL_MONITOR_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }

    /// Returns the socket address for binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            service_name: "vigil".to_string(),
            log_level: LogLevel::Info,
            log_file: Some(PathBuf::from("logs/app.log")),
            log_buffer_size: shared::telemetry::sinks::ring::DEFAULT_RING_CAPACITY,
            elasticsearch_url: None,
            index_prefix: "logs".to_string(),
            chaos: ChaosConfig::default(),
            monitor: MonitorConfig::default(),
            slow_delay: Duration::from_millis(3000),
        }
    }
}

/// Parses an optional variable.
fn parse_var<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {key}"))
}
