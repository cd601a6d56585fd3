//! CUSUM (Cumulative Sum) changepoint detection
//!
//! Two one-sided Page tests run side by side. With reference offset
//! `k = delta / 2` and baseline `mean`:
//!
//! ```text
//! upper = max(0, upper + (x - (mean + k)))
//! lower = max(0, lower - (x - (mean - k)))
//! ```
//!
//! An alarm is raised while a statistic is strictly greater than the
//! threshold `h`. Both flags are recomputed on every update.

use crate::observer::{DetectionEvent, DetectionObserver, NullObserver};
use crate::traits::{
    ChangePointDetectorProperties, ConfigurableDetector, OnlineDetector, SimpleDetector,
};
use crate::types::{alarm_confidence, AlarmDirection, ChangePoint, ChangePointResult, ChangeType};
use robust_core::numeric::{ensure_finite, ensure_non_negative, ensure_positive};
use robust_core::{utils, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CUSUM parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CusumParameters {
    /// Baseline mean of the in-control process
    pub mean: f64,
    /// Smallest shift of the mean worth detecting
    pub delta: f64,
    /// Detection threshold `h`
    pub threshold: f64,
}

impl Default for CusumParameters {
    fn default() -> Self {
        Self {
            mean: 0.0,
            delta: 1.0,
            threshold: 4.0,
        }
    }
}

impl CusumParameters {
    /// Create validated parameters
    pub fn new(mean: f64, delta: f64, threshold: f64) -> Result<Self> {
        let params = Self {
            mean,
            delta,
            threshold,
        };
        params.validate()?;
        Ok(params)
    }

    /// Reject values that make the test meaningless
    ///
    /// A zero `delta` collapses both reference values onto the mean, a negative
    /// one inverts them, and a negative threshold alarms on every sample.
    pub fn validate(&self) -> Result<()> {
        ensure_finite("mean", self.mean)?;
        ensure_positive("delta", self.delta)?;
        ensure_non_negative("threshold", self.threshold)?;
        Ok(())
    }

    /// Reference offset `k = delta / 2`
    #[inline]
    pub fn k(&self) -> f64 {
        self.delta / 2.0
    }

    /// `mean + k`
    #[inline]
    pub fn upper_reference(&self) -> f64 {
        self.mean + self.k()
    }

    /// `mean - k`
    #[inline]
    pub fn lower_reference(&self) -> f64 {
        self.mean - self.k()
    }

    /// Same parameters around a different baseline
    pub fn with_mean(self, mean: f64) -> Self {
        Self { mean, ..self }
    }
}

/// Snapshot of the two cumulative sums and their alarm flags
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CusumState {
    pub upper_sum: f64,
    pub lower_sum: f64,
    pub upper_alarm: bool,
    pub lower_alarm: bool,
}

/// Online two-sided CUSUM detector
#[derive(Clone)]
pub struct CusumDetector<O: DetectionObserver = NullObserver> {
    params: CusumParameters,
    state: CusumState,
    samples_seen: usize,
    observer: O,
}

impl<O: DetectionObserver> fmt::Debug for CusumDetector<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CusumDetector")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("samples_seen", &self.samples_seen)
            .finish()
    }
}

impl CusumDetector<NullObserver> {
    /// Create a new CUSUM detector with both sums at zero
    pub fn new(params: CusumParameters) -> Result<Self> {
        Self::with_observer(params, NullObserver)
    }

    /// Create a detector whose sums start from the given values
    pub fn with_initial_sums(params: CusumParameters, upper_sum: f64, lower_sum: f64) -> Result<Self> {
        ensure_non_negative("upper_sum", upper_sum)?;
        ensure_non_negative("lower_sum", lower_sum)?;
        let mut detector = Self::new(params)?;
        detector.state.upper_sum = upper_sum;
        detector.state.lower_sum = lower_sum;
        Ok(detector)
    }
}

impl<O: DetectionObserver> CusumDetector<O> {
    /// Create a detector reporting to `observer`
    pub fn with_observer(params: CusumParameters, observer: O) -> Result<Self> {
        params.validate()?;
        tracing::debug!(
            mean = params.mean,
            delta = params.delta,
            threshold = params.threshold,
            "created CUSUM detector"
        );
        Ok(Self {
            params,
            state: CusumState::default(),
            samples_seen: 0,
            observer,
        })
    }

    /// Feed one sample and return the direction of the active alarm, if any
    pub fn update(&mut self, sample: f64) -> Option<AlarmDirection> {
        let index = self.samples_seen;
        self.samples_seen += 1;

        let previous = self.state;
        let upper_ref = self.params.upper_reference();
        let lower_ref = self.params.lower_reference();

        self.state.upper_sum = f64::max(0.0, self.state.upper_sum + (sample - upper_ref));
        self.state.lower_sum = f64::max(0.0, self.state.lower_sum - (sample - lower_ref));
        self.state.upper_alarm = self.params.threshold < self.state.upper_sum;
        self.state.lower_alarm = self.params.threshold < self.state.lower_sum;

        if self.observer.is_enabled() {
            if self.state.upper_alarm && !previous.upper_alarm {
                self.emit_alarm(index, AlarmDirection::Upward);
            }
            if self.state.lower_alarm && !previous.lower_alarm {
                self.emit_alarm(index, AlarmDirection::Downward);
            }
        }

        self.which_alarm()
    }

    /// Feed the mean of a window of recent samples
    pub fn update_mean(&mut self, window: &[f64]) -> Result<Option<AlarmDirection>> {
        if window.is_empty() {
            return Err(Error::empty_input("CUSUM window mean"));
        }
        Ok(self.update(utils::mean(window)))
    }

    fn emit_alarm(&mut self, index: usize, direction: AlarmDirection) {
        let event = DetectionEvent::Alarm {
            index,
            direction,
            upper_sum: self.state.upper_sum,
            lower_sum: self.state.lower_sum,
        };
        self.observer.on_event(&event);
    }

    /// True while either statistic is above the threshold
    #[inline]
    pub fn alarm(&self) -> bool {
        self.state.upper_alarm || self.state.lower_alarm
    }

    /// Direction of the active alarm; upward wins when both are active
    pub fn which_alarm(&self) -> Option<AlarmDirection> {
        if self.state.upper_alarm {
            Some(AlarmDirection::Upward)
        } else if self.state.lower_alarm {
            Some(AlarmDirection::Downward)
        } else {
            None
        }
    }

    pub fn upper_sum(&self) -> f64 {
        self.state.upper_sum
    }

    pub fn lower_sum(&self) -> f64 {
        self.state.lower_sum
    }

    pub fn upper_alarm(&self) -> bool {
        self.state.upper_alarm
    }

    pub fn lower_alarm(&self) -> bool {
        self.state.lower_alarm
    }

    pub fn state(&self) -> CusumState {
        self.state
    }

    pub fn parameters(&self) -> &CusumParameters {
        &self.params
    }

    pub fn samples_seen(&self) -> usize {
        self.samples_seen
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Clear both sums and alarms; the baseline and sample count are kept
    pub fn clear(&mut self) {
        self.state = CusumState::default();
    }

    /// Move the baseline and clear the sums
    pub(crate) fn rebaseline(&mut self, mean: f64) {
        self.params = self.params.with_mean(mean);
        self.clear();
    }
}

impl<O: DetectionObserver> fmt::Display for CusumDetector<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "+CUSUM: {}\n-CUSUM: {}",
            self.state.upper_sum, self.state.lower_sum
        )
    }
}

impl<O: DetectionObserver> ChangePointDetectorProperties for CusumDetector<O> {
    fn algorithm_name(&self) -> &'static str {
        "CUSUM"
    }

    fn minimum_sample_size(&self) -> usize {
        1
    }
}

impl<O: DetectionObserver> OnlineDetector for CusumDetector<O> {
    type Output = Option<AlarmDirection>;

    fn process_point(&mut self, value: f64) -> Self::Output {
        self.update(value)
    }

    fn reset(&mut self) {
        self.clear();
        self.samples_seen = 0;
    }

    fn current_index(&self) -> usize {
        self.samples_seen
    }
}

impl<O: DetectionObserver> SimpleDetector for CusumDetector<O> {
    /// Replays the series from zero sums around the current baseline
    ///
    /// A changepoint is reported at every sample where a statistic rises
    /// above the threshold. The statistics trace holds all upper sums
    /// followed by all lower sums.
    fn detect_simple(&self, sample: &[f64]) -> Result<ChangePointResult> {
        if sample.len() < self.minimum_sample_size() {
            return Err(Error::InsufficientData {
                expected: self.minimum_sample_size(),
                actual: sample.len(),
            });
        }

        let mut replay = CusumDetector::new(self.params)?;
        let threshold = self.params.threshold;
        let mut changepoints = Vec::new();
        let mut upper_trace = Vec::with_capacity(sample.len());
        let mut lower_trace = Vec::with_capacity(sample.len());

        for (i, &x) in sample.iter().enumerate() {
            let before = replay.state();
            replay.update(x);
            let after = replay.state();

            if after.upper_alarm && !before.upper_alarm {
                changepoints.push(ChangePoint::with_type(
                    i,
                    alarm_confidence(after.upper_sum, threshold),
                    ChangeType::MeanShift(AlarmDirection::Upward),
                ));
            }
            if after.lower_alarm && !before.lower_alarm {
                changepoints.push(ChangePoint::with_type(
                    i,
                    alarm_confidence(after.lower_sum, threshold),
                    ChangeType::MeanShift(AlarmDirection::Downward),
                ));
            }

            upper_trace.push(after.upper_sum);
            lower_trace.push(after.lower_sum);
        }

        upper_trace.extend(lower_trace);
        Ok(ChangePointResult::new(
            changepoints,
            self.algorithm_name().to_string(),
            sample.len(),
            upper_trace,
        ))
    }
}

impl<O: DetectionObserver> ConfigurableDetector for CusumDetector<O> {
    type Parameters = CusumParameters;

    fn parameters(&self) -> &Self::Parameters {
        &self.params
    }

    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        self.clear();
        Ok(())
    }
}
