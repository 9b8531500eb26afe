//! Stateful scalar-stream smoothing filters.
//!
//! Two independent smoothers share the [`ScalarFilter`] capability so callers
//! can stay generic over {update, reset}:
//!
//! - [`LowPassFilter`]: first-order exponential smoother,
//!   `value' = value * factor + input * (1 - factor)`.
//! - [`MeanFilter`]: sliding-window arithmetic mean over the last K inputs.
//!
//! Both filters keep their state private; it changes only through their own
//! update call. `reset` returns a filter to the zero baseline, which forgets
//! the signal level entirely. Callers that resume on a live signal should
//! re-prime (`MeanFilter::init`, or feed the low-pass a few readings) to
//! avoid a startup discontinuity in the smoothed output.

use crate::limits::MAX_FILTER_WINDOW;

/// Capability shared by scalar smoothing filters.
pub trait ScalarFilter {
    /// Feed one reading and return the smoothed value.
    fn filter(&mut self, reading: f64) -> f64;

    /// Return the filter to its zero baseline.
    fn reset(&mut self);
}

/// First-order exponential smoother.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    value: f64,
    factor: f64,
}

impl LowPassFilter {
    /// Smoothing factor used when none is specified.
    pub const DEFAULT_FACTOR: f64 = 0.95;

    /// Create a filter with the given smoothing factor.
    ///
    /// The factor is clamped into [0, 1]; larger factors smooth harder and
    /// respond slower.
    pub fn new(factor: f64) -> Self {
        Self {
            value: 0.0,
            factor: factor.clamp(0.0, 1.0),
        }
    }

    /// Current smoothed value without feeding a new reading.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}

impl ScalarFilter for LowPassFilter {
    fn filter(&mut self, reading: f64) -> f64 {
        self.value = self.value * self.factor + reading * (1.0 - self.factor);
        self.value
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}

/// Sliding-window mean over the last K readings.
///
/// The output of every call is the mean of the most recent K inputs
/// including the new one. The mean is recomputed from the stored window on
/// every call; there is no running sum to drift.
#[derive(Debug, Clone)]
pub struct MeanFilter {
    window: Vec<f64>,
}

impl MeanFilter {
    /// Create a filter over a window of `len` readings.
    ///
    /// The length is clamped into [1, 100]. The window starts at the zero
    /// baseline; use [`init`](Self::init) to pre-fill it with a known level.
    pub fn new(len: usize) -> Self {
        let len = len.clamp(1, MAX_FILTER_WINDOW);
        Self {
            window: vec![0.0; len],
        }
    }

    /// Fill the whole window with a constant, priming the filter so the next
    /// outputs stay on `value` instead of climbing up from zero.
    pub fn init(&mut self, value: f64) {
        self.window.fill(value);
    }

    /// Window length in readings.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}

impl ScalarFilter for MeanFilter {
    fn filter(&mut self, reading: f64) -> f64 {
        self.window.copy_within(1.., 0);
        let last = self.window.len() - 1;
        self.window[last] = reading;
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    fn reset(&mut self) {
        self.window.fill(0.0);
    }
}
