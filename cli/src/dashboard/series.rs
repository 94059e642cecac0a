//! Rolling sample window for a single chart.

use std::collections::VecDeque;

/// Default number of samples shown per chart.
pub const DEFAULT_WINDOW: usize = 20;

/// Fixed-length FIFO of samples, pre-filled with zeros.
///
/// The length never changes after construction: every push evicts the
/// oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesBuffer {
    samples: VecDeque<f64>,
}

impl TimeSeriesBuffer {
    /// Creates a window of `len` zeros. A zero length is raised to one.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        Self {
            samples: std::iter::repeat(0.0).take(len).collect(),
        }
    }

    /// Evicts the oldest sample and appends `value`.
    pub fn push(&mut self, value: f64) {
        self.samples.pop_front();
        self.samples.push_back(value);
    }

    /// Most recent sample.
    #[must_use]
    pub fn latest(&self) -> f64 {
        self.samples.back().copied().unwrap_or_default()
    }

    /// Samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl Default for TimeSeriesBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
