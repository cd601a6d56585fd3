//! Self-rebaselining CUSUM
//!
//! Wraps a [`CusumDetector`]. When an alarm fires, the reference value that
//! was crossed becomes the new baseline mean and both sums start over, so a
//! sustained shift is reported once and a further shift from the new level can
//! still be detected.

use crate::cusum::{CusumDetector, CusumParameters};
use crate::observer::{DetectionEvent, DetectionObserver, NullObserver};
use crate::traits::{
    ChangePointDetectorProperties, ConfigurableDetector, OnlineDetector, SimpleDetector,
};
use crate::types::{alarm_confidence, AlarmDirection, ChangePoint, ChangePointResult, ChangeType, Rebaseline};
use robust_core::{Error, Result};
use std::fmt;

/// CUSUM detector that moves its baseline on every alarm
#[derive(Clone)]
pub struct AdaptiveCusumDetector<O: DetectionObserver = NullObserver> {
    cusum: CusumDetector<O>,
}

impl<O: DetectionObserver> fmt::Debug for AdaptiveCusumDetector<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveCusumDetector")
            .field("cusum", &self.cusum)
            .finish()
    }
}

impl AdaptiveCusumDetector<NullObserver> {
    pub fn new(params: CusumParameters) -> Result<Self> {
        Ok(Self {
            cusum: CusumDetector::new(params)?,
        })
    }

    /// Start from non-zero sums, as [`CusumDetector::with_initial_sums`]
    pub fn with_initial_sums(params: CusumParameters, upper_sum: f64, lower_sum: f64) -> Result<Self> {
        Ok(Self {
            cusum: CusumDetector::with_initial_sums(params, upper_sum, lower_sum)?,
        })
    }
}

impl<O: DetectionObserver> AdaptiveCusumDetector<O> {
    /// Create a detector reporting alarms and baseline moves to `observer`
    pub fn with_observer(params: CusumParameters, observer: O) -> Result<Self> {
        Ok(Self {
            cusum: CusumDetector::with_observer(params, observer)?,
        })
    }

    /// Feed one sample; returns the baseline move if an alarm fired
    ///
    /// After a `Some` return the sums are zero and no alarm is active.
    pub fn update(&mut self, sample: f64) -> Option<Rebaseline> {
        let direction = self.cusum.update(sample)?;
        Some(self.reinitialize(direction))
    }

    /// Move the baseline onto the reference value of `direction` and clear the sums
    ///
    /// The offset `k` is unchanged; both reference values follow the new mean.
    pub fn reinitialize(&mut self, direction: AlarmDirection) -> Rebaseline {
        let params = self.cusum.parameters();
        let previous_mean = params.mean;
        let new_mean = match direction {
            AlarmDirection::Upward => params.upper_reference(),
            AlarmDirection::Downward => params.lower_reference(),
        };
        self.cusum.rebaseline(new_mean);

        // the alarm that triggered this call was sample `samples_seen - 1`
        let index = self.cusum.samples_seen().saturating_sub(1);
        tracing::trace!(index, %direction, previous_mean, new_mean, "adaptive CUSUM rebaselined");
        if self.cusum.observer().is_enabled() {
            let event = DetectionEvent::Rebaseline {
                index,
                direction,
                previous_mean,
                new_mean,
            };
            self.cusum.observer_mut().on_event(&event);
        }

        Rebaseline {
            direction,
            previous_mean,
            new_mean,
        }
    }

    /// Current baseline mean
    pub fn mean(&self) -> f64 {
        self.cusum.parameters().mean
    }

    pub fn k(&self) -> f64 {
        self.cusum.parameters().k()
    }

    pub fn upper_reference(&self) -> f64 {
        self.cusum.parameters().upper_reference()
    }

    pub fn lower_reference(&self) -> f64 {
        self.cusum.parameters().lower_reference()
    }

    pub fn threshold(&self) -> f64 {
        self.cusum.parameters().threshold
    }

    pub fn alarm(&self) -> bool {
        self.cusum.alarm()
    }

    /// The wrapped CUSUM detector
    pub fn cusum(&self) -> &CusumDetector<O> {
        &self.cusum
    }

    pub fn observer(&self) -> &O {
        self.cusum.observer()
    }

    pub fn observer_mut(&mut self) -> &mut O {
        self.cusum.observer_mut()
    }
}

impl<O: DetectionObserver> fmt::Display for AdaptiveCusumDetector<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\nMean: {}", self.cusum, self.mean())
    }
}

impl<O: DetectionObserver> ChangePointDetectorProperties for AdaptiveCusumDetector<O> {
    fn algorithm_name(&self) -> &'static str {
        "Adaptive CUSUM"
    }

    fn minimum_sample_size(&self) -> usize {
        1
    }
}

impl<O: DetectionObserver> OnlineDetector for AdaptiveCusumDetector<O> {
    type Output = Option<Rebaseline>;

    fn process_point(&mut self, value: f64) -> Self::Output {
        self.update(value)
    }

    /// Clears the sums and sample count; the current baseline is kept
    fn reset(&mut self) {
        self.cusum.reset();
    }

    fn current_index(&self) -> usize {
        self.cusum.current_index()
    }
}

impl<O: DetectionObserver> SimpleDetector for AdaptiveCusumDetector<O> {
    /// Replays the series from the current baseline
    ///
    /// Every alarm is a changepoint. The statistics trace holds the baseline
    /// mean in force after each sample.
    fn detect_simple(&self, sample: &[f64]) -> Result<ChangePointResult> {
        if sample.len() < self.minimum_sample_size() {
            return Err(Error::InsufficientData {
                expected: self.minimum_sample_size(),
                actual: sample.len(),
            });
        }

        let mut replay: AdaptiveCusumDetector = AdaptiveCusumDetector::new(*self.cusum.parameters())?;
        let mut changepoints = Vec::new();
        let mut means = Vec::with_capacity(sample.len());

        for (i, &x) in sample.iter().enumerate() {
            // the rebaseline clears the sums, so the crossing value is taken first
            let upper = replay.cusum().upper_sum() + (x - replay.upper_reference());
            let lower = replay.cusum().lower_sum() - (x - replay.lower_reference());
            if let Some(step) = replay.update(x) {
                let statistic = match step.direction {
                    AlarmDirection::Upward => upper,
                    AlarmDirection::Downward => lower,
                };
                changepoints.push(ChangePoint::with_type(
                    i,
                    alarm_confidence(statistic, replay.threshold()),
                    ChangeType::MeanShift(step.direction),
                ));
            }
            means.push(replay.mean());
        }

        Ok(ChangePointResult::new(
            changepoints,
            self.algorithm_name().to_string(),
            sample.len(),
            means,
        ))
    }
}

impl<O: DetectionObserver> ConfigurableDetector for AdaptiveCusumDetector<O> {
    type Parameters = CusumParameters;

    fn parameters(&self) -> &Self::Parameters {
        self.cusum.parameters()
    }

    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()> {
        self.cusum.set_parameters(params)
    }
}
