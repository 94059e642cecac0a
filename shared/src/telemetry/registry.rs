//! Metric registry.
//!
//! Provides `MetricRegistry`, a thin layer over a `prometheus::Registry` that
//! tracks declared families by name so misuse (duplicate declarations,
//! undeclared names, wrong label arity) surfaces as a typed [`MetricError`].

use prometheus::core::Collector;
use prometheus::proto::Metric;
use prometheus::{Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Content type of the text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

/// Errors raised by misuse of the registry.
///
/// These indicate instrumentation bugs rather than runtime data problems, so
/// callers are expected to surface them loudly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    /// A metric with this name has already been declared.
    #[error("Metric already declared: {0}")]
    DuplicateMetric(String),

    /// No metric of the requested kind with this name has been declared.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// The label values do not match the declared label names.
    #[error("Invalid label set for {name}: expected {expected} values, got {got}")]
    InvalidLabelSet {
        /// Metric name.
        name: String,
        /// Number of declared label names.
        expected: usize,
        /// Number of label values supplied.
        got: usize,
    },

    /// A metric or label name was rejected.
    #[error("Invalid metric or label name: {0}")]
    InvalidName(String),

    /// The same label name appears twice in one declaration.
    #[error("Duplicate label {label:?} in {name}")]
    DuplicateLabel {
        /// Metric name.
        name: String,
        /// Repeated label name.
        label: String,
    },

    /// The exposition could not be encoded.
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),

    /// Failed to acquire a lock on the registry.
    #[error("Failed to acquire lock on metric registry")]
    LockPoisoned,
}

/// One observed label tuple and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSample {
    /// Label values, in declaration order.
    pub labels: Vec<String>,
    /// Current counter value.
    pub value: u64,
}

/// Point-in-time copy of one counter family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    /// Counter name.
    pub name: String,
    /// Help text.
    pub help: String,
    /// Declared label names.
    pub label_names: Vec<String>,
    /// Observed label tuples, sorted by label values.
    pub samples: Vec<CounterSample>,
}

impl CounterSnapshot {
    /// Returns the value recorded for `labels`, or 0 if never observed.
    #[must_use]
    pub fn value(&self, labels: &[&str]) -> u64 {
        self.samples
            .iter()
            .find(|s| s.labels.iter().map(String::as_str).eq(labels.iter().copied()))
            .map_or(0, |s| s.value)
    }

    /// Returns the sum over all label tuples.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.samples.iter().map(|s| s.value).sum()
    }
}

struct CounterFamily {
    help: String,
    label_names: Vec<String>,
    vec: IntCounterVec,
}

impl CounterFamily {
    /// Collects every child keyed by its label values in declaration order.
    fn samples(&self) -> BTreeMap<Vec<String>, u64> {
        let families = self.vec.collect();
        families
            .iter()
            .flat_map(|family| family.get_metric())
            .map(|metric| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let value = metric.get_counter().get_value() as u64;
                (ordered_labels(metric, &self.label_names), value)
            })
            .collect()
    }
}

struct HistogramFamily {
    label_names: Vec<String>,
    vec: HistogramVec,
}

#[derive(Clone)]
enum Family {
    Counter(Arc<CounterFamily>),
    Histogram(Arc<HistogramFamily>),
    Gauge(Gauge),
}

/// Registry of named counters, histograms and gauges.
///
/// Families are declared once at startup and never removed. Counter
/// increments are atomic, so concurrent increments never lose updates and
/// readers never observe a tuple with the wrong arity.
///
/// # Example
///
/// ```
/// use shared::telemetry::MetricRegistry;
///
/// let registry = MetricRegistry::new();
/// registry
///     .declare_counter("errors_total", "Total errors", &["type"])
///     .unwrap();
///
/// registry.increment("errors_total", &["server_error"]).unwrap();
/// assert_eq!(registry.get("errors_total", &["server_error"]).unwrap(), 1);
/// ```
pub struct MetricRegistry {
    registry: Registry,
    families: RwLock<BTreeMap<String, Family>>,
}

impl MetricRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an empty registry wrapped in an Arc.
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Declares a counter family.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A metric named `name` already exists
    /// - `name` or any label name is not a valid identifier
    /// - A label name is repeated
    pub fn declare_counter(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
    ) -> Result<(), MetricError> {
        check_unique_labels(name, label_names)?;
        let vec = IntCounterVec::new(Opts::new(name, help), label_names)
            .map_err(|e| declare_error(name, e))?;

        self.insert(
            name,
            Box::new(vec.clone()),
            Family::Counter(Arc::new(CounterFamily {
                help: help.to_string(),
                label_names: owned(label_names),
                vec,
            })),
        )
    }

    /// Declares a histogram family with the given bucket upper bounds.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::declare_counter`].
    pub fn declare_histogram(
        &self,
        name: &str,
        help: &str,
        label_names: &[&str],
        buckets: &[f64],
    ) -> Result<(), MetricError> {
        check_unique_labels(name, label_names)?;
        let opts = HistogramOpts::new(name, help).buckets(buckets.to_vec());
        let vec = HistogramVec::new(opts, label_names).map_err(|e| declare_error(name, e))?;

        self.insert(
            name,
            Box::new(vec.clone()),
            Family::Histogram(Arc::new(HistogramFamily {
                label_names: owned(label_names),
                vec,
            })),
        )
    }

    /// Declares an unlabelled gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or invalid.
    pub fn declare_gauge(&self, name: &str, help: &str) -> Result<(), MetricError> {
        let gauge = Gauge::new(name, help).map_err(|e| declare_error(name, e))?;
        self.insert(name, Box::new(gauge.clone()), Family::Gauge(gauge))
    }

    /// Registers the standard `process_*` collector (resident and virtual
    /// memory, CPU seconds, open fds, start time). A no-op off Linux.
    ///
    /// # Errors
    ///
    /// Returns an error if the collector is already registered.
    pub fn register_process_collector(&self) -> Result<(), MetricError> {
        #[cfg(target_os = "linux")]
        self.registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| declare_error("process", e))?;
        Ok(())
    }

    /// Increments the counter `name` for the given label values by one.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter is not declared or the number of label
    /// values differs from the declared label names.
    pub fn increment(&self, name: &str, label_values: &[&str]) -> Result<(), MetricError> {
        self.increment_by(name, label_values, 1)
    }

    /// Increments the counter `name` for the given label values by `amount`.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter is not declared or the number of label
    /// values differs from the declared label names.
    pub fn increment_by(
        &self,
        name: &str,
        label_values: &[&str],
        amount: u64,
    ) -> Result<(), MetricError> {
        self.counter(name)?
            .vec
            .get_metric_with_label_values(label_values)
            .map_err(|e| label_error(name, e))?
            .inc_by(amount);
        Ok(())
    }

    /// Returns the current value for a label tuple (0 if never observed).
    ///
    /// Reading never creates the tuple.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter is not declared or the label arity is wrong.
    pub fn get(&self, name: &str, label_values: &[&str]) -> Result<u64, MetricError> {
        let family = self.counter(name)?;
        check_arity(name, &family.label_names, label_values)?;

        let key = owned(label_values);
        Ok(family.samples().get(&key).copied().unwrap_or(0))
    }

    /// Records one observation in the histogram `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram is not declared or the label arity is wrong.
    pub fn observe(&self, name: &str, label_values: &[&str], value: f64) -> Result<(), MetricError> {
        self.histogram(name)?
            .vec
            .get_metric_with_label_values(label_values)
            .map_err(|e| label_error(name, e))?
            .observe(value);
        Ok(())
    }

    /// Returns how many observations a histogram tuple has recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram is not declared or the label arity is wrong.
    pub fn observation_count(&self, name: &str, label_values: &[&str]) -> Result<u64, MetricError> {
        let family = self.histogram(name)?;
        check_arity(name, &family.label_names, label_values)?;

        let key = owned(label_values);
        let families = family.vec.collect();
        Ok(families
            .iter()
            .flat_map(|f| f.get_metric())
            .find(|m| ordered_labels(m, &family.label_names) == key)
            .map_or(0, |m| m.get_histogram().get_sample_count()))
    }

    /// Sets the gauge `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gauge is not declared.
    pub fn set_gauge(&self, name: &str, value: f64) -> Result<(), MetricError> {
        match self.family(name)? {
            Family::Gauge(gauge) => {
                gauge.set(value);
                Ok(())
            }
            _ => Err(MetricError::UnknownMetric(name.to_string())),
        }
    }

    /// Returns the names of all declared counters, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn names(&self) -> Result<Vec<String>, MetricError> {
        let families = self
            .families
            .read()
            .map_err(|_| MetricError::LockPoisoned)?;
        Ok(families
            .iter()
            .filter(|(_, family)| matches!(family, Family::Counter(_)))
            .map(|(name, _)| name.clone())
            .collect())
    }

    /// Copies every counter family and its observed label tuples.
    ///
    /// Families are sorted by name and tuples by label values.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn snapshot(&self) -> Result<Vec<CounterSnapshot>, MetricError> {
        let families = self
            .families
            .read()
            .map_err(|_| MetricError::LockPoisoned)?;

        Ok(families
            .iter()
            .filter_map(|(name, family)| match family {
                Family::Counter(counter) => Some((name, counter)),
                _ => None,
            })
            .map(|(name, family)| CounterSnapshot {
                name: name.clone(),
                help: family.help.clone(),
                label_names: family.label_names.clone(),
                samples: family
                    .samples()
                    .into_iter()
                    .map(|(labels, value)| CounterSample { labels, value })
                    .collect(),
            })
            .collect())
    }

    /// Renders every registered family in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render(&self) -> Result<String, MetricError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| MetricError::Encoding(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| MetricError::Encoding(e.to_string()))
    }

    /// Registers `collector` and records it under `name`, both under the
    /// write lock so a name is never half-declared.
    fn insert(
        &self,
        name: &str,
        collector: Box<dyn Collector>,
        family: Family,
    ) -> Result<(), MetricError> {
        let mut families = self
            .families
            .write()
            .map_err(|_| MetricError::LockPoisoned)?;
        if families.contains_key(name) {
            return Err(MetricError::DuplicateMetric(name.to_string()));
        }
        self.registry
            .register(collector)
            .map_err(|e| declare_error(name, e))?;

        families.insert(name.to_string(), family);
        Ok(())
    }

    fn family(&self, name: &str) -> Result<Family, MetricError> {
        let families = self
            .families
            .read()
            .map_err(|_| MetricError::LockPoisoned)?;
        families
            .get(name)
            .cloned()
            .ok_or_else(|| MetricError::UnknownMetric(name.to_string()))
    }

    fn counter(&self, name: &str) -> Result<Arc<CounterFamily>, MetricError> {
        match self.family(name)? {
            Family::Counter(counter) => Ok(counter),
            _ => Err(MetricError::UnknownMetric(name.to_string())),
        }
    }

    fn histogram(&self, name: &str) -> Result<Arc<HistogramFamily>, MetricError> {
        match self.family(name)? {
            Family::Histogram(histogram) => Ok(histogram),
            _ => Err(MetricError::UnknownMetric(name.to_string())),
        }
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("counters", &self.names().unwrap_or_default())
            .finish_non_exhaustive()
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

/// Exposition label pairs are sorted by name; reorder them to declaration order.
fn ordered_labels(metric: &Metric, label_names: &[String]) -> Vec<String> {
    label_names
        .iter()
        .map(|name| {
            metric
                .get_label()
                .iter()
                .find(|pair| pair.get_name() == name)
                .map(|pair| pair.get_value().to_string())
                .unwrap_or_default()
        })
        .collect()
}

fn check_unique_labels(name: &str, label_names: &[&str]) -> Result<(), MetricError> {
    let mut seen = HashSet::new();
    match label_names.iter().find(|label| !seen.insert(**label)) {
        Some(label) => Err(MetricError::DuplicateLabel {
            name: name.to_string(),
            label: (*label).to_string(),
        }),
        None => Ok(()),
    }
}

fn check_arity(name: &str, label_names: &[String], label_values: &[&str]) -> Result<(), MetricError> {
    if label_names.len() == label_values.len() {
        Ok(())
    } else {
        Err(MetricError::InvalidLabelSet {
            name: name.to_string(),
            expected: label_names.len(),
            got: label_values.len(),
        })
    }
}

fn declare_error(name: &str, err: prometheus::Error) -> MetricError {
    match err {
        prometheus::Error::AlreadyReg => MetricError::DuplicateMetric(name.to_string()),
        prometheus::Error::Msg(reason) => MetricError::InvalidName(reason),
        other => MetricError::Encoding(other.to_string()),
    }
}

fn label_error(name: &str, err: prometheus::Error) -> MetricError {
    match err {
        prometheus::Error::InconsistentCardinality { expect, got } => MetricError::InvalidLabelSet {
            name: name.to_string(),
            expected: expect,
            got,
        },
        other => MetricError::Encoding(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn registry_with_requests() -> MetricRegistry {
        let registry = MetricRegistry::new();
        registry
            .declare_counter(
                "http_requests_total",
                "Total HTTP requests",
                &["method", "route", "status"],
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_declare_duplicate_fails() {
        let registry = registry_with_requests();
        let result = registry.declare_counter("http_requests_total", "again", &["method"]);

        assert_eq!(
            result,
            Err(MetricError::DuplicateMetric("http_requests_total".to_string()))
        );
    }

    #[test]
    fn test_declare_duplicate_across_kinds_fails() {
        let registry = registry_with_requests();

        assert_eq!(
            registry.declare_gauge("http_requests_total", "shadow"),
            Err(MetricError::DuplicateMetric("http_requests_total".to_string()))
        );
    }

    #[test]
    fn test_declare_rejects_invalid_names() {
        let registry = MetricRegistry::new();

        assert!(matches!(
            registry.declare_counter("1bad", "help", &[]),
            Err(MetricError::InvalidName(_))
        ));
        assert!(matches!(
            registry.declare_counter("good_total", "help", &["bad-label"]),
            Err(MetricError::InvalidName(_))
        ));
    }

    #[test]
    fn test_declare_rejects_repeated_label() {
        let registry = MetricRegistry::new();

        assert_eq!(
            registry.declare_counter("pairs_total", "help", &["a", "a"]),
            Err(MetricError::DuplicateLabel {
                name: "pairs_total".to_string(),
                label: "a".to_string(),
            })
        );
        assert!(registry.names().unwrap().is_empty());
    }

    #[test]
    fn test_increment_unknown_metric_fails() {
        let registry = MetricRegistry::new();
        let result = registry.increment("missing_total", &[]);

        assert_eq!(
            result,
            Err(MetricError::UnknownMetric("missing_total".to_string()))
        );
    }

    #[test]
    fn test_increment_wrong_arity_fails() {
        let registry = registry_with_requests();
        let result = registry.increment("http_requests_total", &["GET", "/"]);

        assert_eq!(
            result,
            Err(MetricError::InvalidLabelSet {
                name: "http_requests_total".to_string(),
                expected: 3,
                got: 2,
            })
        );
        assert!(registry.snapshot().unwrap()[0].samples.is_empty());
    }

    #[test]
    fn test_increment_creates_and_accumulates() {
        let registry = registry_with_requests();

        registry
            .increment("http_requests_total", &["GET", "/", "200"])
            .unwrap();
        registry
            .increment("http_requests_total", &["GET", "/", "200"])
            .unwrap();
        registry
            .increment_by("http_requests_total", &["POST", "/", "201"], 5)
            .unwrap();

        assert_eq!(
            registry.get("http_requests_total", &["GET", "/", "200"]).unwrap(),
            2
        );
        assert_eq!(
            registry.get("http_requests_total", &["POST", "/", "201"]).unwrap(),
            5
        );
        assert_eq!(
            registry.get("http_requests_total", &["GET", "/x", "200"]).unwrap(),
            0
        );
    }

    #[test]
    fn test_get_does_not_create_tuple() {
        let registry = registry_with_requests();

        registry
            .get("http_requests_total", &["GET", "/", "200"])
            .unwrap();

        assert!(registry.snapshot().unwrap()[0].samples.is_empty());
        assert!(!registry.render().unwrap().contains("http_requests_total{"));
    }

    #[test]
    fn test_labels_keep_declaration_order() {
        let registry = MetricRegistry::new();
        registry
            .declare_counter("hits_total", "Hits", &["zone", "app"])
            .unwrap();
        registry.increment("hits_total", &["eu", "web"]).unwrap();

        let snapshot = registry.snapshot().unwrap();

        assert_eq!(snapshot[0].samples[0].labels, vec!["eu", "web"]);
        assert_eq!(registry.get("hits_total", &["eu", "web"]).unwrap(), 1);
    }

    #[test]
    fn test_concurrent_increments_lose_no_updates() {
        let registry = Arc::new(registry_with_requests());
        let threads = 8;
        let per_thread = 1_000;

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..per_thread {
                        registry
                            .increment("http_requests_total", &["GET", "/api/users", "200"])
                            .unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(
            registry
                .get("http_requests_total", &["GET", "/api/users", "200"])
                .unwrap(),
            threads * per_thread
        );
    }

    #[test]
    fn test_snapshot_during_increments_keeps_arity() {
        let registry = Arc::new(registry_with_requests());
        let writer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..500 {
                    let status = if i % 2 == 0 { "200" } else { "500" };
                    registry
                        .increment("http_requests_total", &["GET", "/", status])
                        .unwrap();
                }
            })
        };

        for _ in 0..50 {
            for family in registry.snapshot().unwrap() {
                for sample in &family.samples {
                    assert_eq!(sample.labels.len(), family.label_names.len());
                    assert!(sample.labels.iter().all(|l| !l.is_empty()));
                }
            }
        }

        writer.join().unwrap();
        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot[0].total(), 500);
        assert_eq!(snapshot[0].value(&["GET", "/", "200"]), 250);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = MetricRegistry::new();
        registry.declare_counter("zeta_total", "z", &["k"]).unwrap();
        registry.declare_counter("alpha_total", "a", &["k"]).unwrap();
        registry.increment("alpha_total", &["b"]).unwrap();
        registry.increment("alpha_total", &["a"]).unwrap();

        let snapshot = registry.snapshot().unwrap();

        assert_eq!(snapshot[0].name, "alpha_total");
        assert_eq!(snapshot[1].name, "zeta_total");
        assert_eq!(snapshot[0].samples[0].labels, vec!["a".to_string()]);
        assert_eq!(registry.names().unwrap(), vec!["alpha_total", "zeta_total"]);
    }

    #[test]
    fn test_render_exposition_format() {
        let registry = MetricRegistry::new();
        registry
            .declare_counter("errors_total", "Total errors", &["type"])
            .unwrap();
        registry.increment("errors_total", &["server_error"]).unwrap();
        registry.increment("errors_total", &["say \"hi\""]).unwrap();

        let text = registry.render().unwrap();

        assert!(text.contains("# HELP errors_total Total errors\n"));
        assert!(text.contains("# TYPE errors_total counter\n"));
        assert!(text.contains("errors_total{type=\"server_error\"} 1\n"));
        assert!(text.contains("errors_total{type=\"say \\\"hi\\\"\"} 1\n"));
    }

    #[test]
    fn test_render_gauge_and_histogram() {
        let registry = MetricRegistry::new();
        registry.declare_gauge("system_cpu_usage", "CPU").unwrap();
        registry
            .declare_histogram("latency_seconds", "Latency", &["route"], &[0.1, 1.0])
            .unwrap();

        registry.set_gauge("system_cpu_usage", 12.5).unwrap();
        registry.observe("latency_seconds", &["/"], 0.05).unwrap();
        registry.observe("latency_seconds", &["/"], 0.5).unwrap();

        let text = registry.render().unwrap();

        assert!(text.contains("# TYPE system_cpu_usage gauge\n"));
        assert!(text.contains("system_cpu_usage 12.5\n"));
        assert!(text.contains("# TYPE latency_seconds histogram\n"));
        assert!(text.contains("latency_seconds_bucket{route=\"/\",le=\"0.1\"} 1\n"));
        assert!(text.contains("latency_seconds_count{route=\"/\"} 2\n"));
        assert_eq!(registry.observation_count("latency_seconds", &["/"]).unwrap(), 2);
    }

    #[test]
    fn test_histogram_and_gauge_misuse() {
        let registry = MetricRegistry::new();
        registry
            .declare_histogram("latency_seconds", "Latency", &["route"], &[1.0])
            .unwrap();

        assert_eq!(
            registry.observe("latency_seconds", &[], 1.0),
            Err(MetricError::InvalidLabelSet {
                name: "latency_seconds".to_string(),
                expected: 1,
                got: 0,
            })
        );
        assert_eq!(
            registry.increment("latency_seconds", &["/"]),
            Err(MetricError::UnknownMetric("latency_seconds".to_string()))
        );
        assert_eq!(
            registry.set_gauge("missing", 1.0),
            Err(MetricError::UnknownMetric("missing".to_string()))
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_collector_exports_memory() {
        let registry = MetricRegistry::new();
        registry.register_process_collector().unwrap();

        let text = registry.render().unwrap();

        assert!(text.contains("# TYPE process_resident_memory_bytes gauge"));
        assert!(text.contains("# TYPE process_virtual_memory_bytes gauge"));
        assert!(registry.register_process_collector().is_err());
    }
}
