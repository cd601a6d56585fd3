//! Core traits for sequential changepoint detection
//!
//! Every detector is an owned, mutable state machine fed one sample at a time
//! ([`OnlineDetector`]). Recorded series can be replayed through a fresh copy
//! of a detector with [`SimpleDetector`], which collects the alarms into a
//! [`ChangePointResult`].

use crate::types::ChangePointResult;
use robust_core::Result;

/// Properties of a changepoint detector
pub trait ChangePointDetectorProperties {
    /// Get the name of the detection algorithm
    fn algorithm_name(&self) -> &'static str;

    /// Get the minimum sample size required for a replay
    fn minimum_sample_size(&self) -> usize;
}

/// Online detection: one call per incoming sample
///
/// Implementations must be driven by a single caller per stream. Independent
/// streams use independent instances and share nothing.
pub trait OnlineDetector {
    /// What a single update reports
    type Output;

    /// Process a single point
    fn process_point(&mut self, value: f64) -> Self::Output;

    /// Reset internal state, keeping the configuration
    fn reset(&mut self);

    /// Number of samples processed since construction or the last reset
    fn current_index(&self) -> usize;
}

/// Replay of a recorded series
pub trait SimpleDetector: ChangePointDetectorProperties {
    /// Run a fresh copy of this detector over `sample` and collect its alarms
    ///
    /// The detector itself is left untouched.
    fn detect_simple(&self, sample: &[f64]) -> Result<ChangePointResult>;
}

/// Access to, and replacement of, a detector's parameters
pub trait ConfigurableDetector {
    type Parameters;

    fn parameters(&self) -> &Self::Parameters;

    /// Validate and install new parameters; accumulated state is cleared
    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()>;
}
