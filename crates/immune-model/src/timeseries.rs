//! Time Series Buffer
//!
//! Append-only sample storage with lookback indexing, the foundation for the
//! delayed terms in the immune equations.

use serde::{Deserialize, Serialize};

/// Append-only sequence of numeric samples for one tracked quantity.
///
/// Samples are indexed by "steps back from now" rather than absolute time,
/// which is what the delay-differential terms need. Buffers grow one sample
/// per step and are never pruned.
///
/// # Example
///
/// ```
/// use immune_model::TimeSeries;
///
/// let mut series = TimeSeries::new();
/// series.push(1.0);
/// series.push(2.0);
/// series.push(3.0);
/// assert_eq!(series.latest(), Some(3.0));
/// assert_eq!(series.delayed(2), Some(1.0));
/// assert_eq!(series.delayed(5), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    samples: Vec<f64>,
}

impl TimeSeries {
    /// Creates an empty series.
    pub fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Creates an empty series with capacity for `steps` samples.
    pub fn with_capacity(steps: usize) -> Self {
        Self {
            samples: Vec::with_capacity(steps),
        }
    }

    /// Appends one sample.
    pub fn push(&mut self, value: f64) {
        self.samples.push(value);
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no samples have been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    /// The sample `steps_back` positions before the most recent one.
    ///
    /// `delayed(0)` is the latest sample. Returns `None` when the series is
    /// shorter than the requested lookback; delay terms substitute zero in
    /// that case (cold-start policy).
    pub fn delayed(&self, steps_back: usize) -> Option<f64> {
        if steps_back >= self.samples.len() {
            return None;
        }
        Some(self.samples[self.samples.len() - 1 - steps_back])
    }

    /// Adds `amount` to the most recent sample in place.
    ///
    /// No-op on an empty series. Used when a repeat exposure folds into an
    /// already-tracked strain trajectory.
    pub fn fold_into_latest(&mut self, amount: f64) {
        if let Some(last) = self.samples.last_mut() {
            *last += amount;
        }
    }

    /// All samples in chronological order.
    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// Iterator over samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}

impl From<Vec<f64>> for TimeSeries {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}
