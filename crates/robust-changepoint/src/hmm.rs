//! Spike detection with a two-regime forward filter
//!
//! Each sample is scored under two hypotheses. The Null hypothesis `H`
//! explains the stream with the low-variance regime alone; the Alternative
//! `K` lets it hop between the low- and high-variance regimes according to a
//! small transition table. Four unnormalized forward probabilities are carried
//! from sample to sample:
//!
//! ```text
//! apH0 = d_lo
//! apH1 = apH1' * d_hi / (apH0' + apH1')
//! apK0 = (apK0' * t00 + apK1' * t01) * d_lo / (apK0' + apK1')
//! apK1 = (apK0  * t10 + apK1' * t11) * d_hi / (apK0' + apK1')
//! ```
//!
//! Primes mark the previous values. `apK1` mixes in the freshly updated
//! `apK0`, and `apH0` drops its history entirely. Whether either asymmetry is
//! intended is not known; both are kept exactly as the detector has always
//! computed them and are pending review by a domain expert.
//!
//! Evaluation order differs from the formulas above only to stay in range:
//! previous values are divided by their mass before being multiplied by a
//! density, and every result is kept inside `[MIN_POSITIVE, MAX]` by
//! [`guard_range`].
//!
//! The log of the K/H mass ratio is accumulated into `llr`. A spike is
//! reported when `llr > h`; the filter is then re-seeded on the following
//! sample together with both ratios. When `llr` drops below zero it is clamped
//! and the filter is re-seeded on the following sample, keeping `llr`.

use crate::adaptive::AdaptiveCusumDetector;
use crate::cusum::CusumParameters;
use crate::observer::{DetectionEvent, DetectionObserver, NullObserver};
use crate::traits::{
    ChangePointDetectorProperties, ConfigurableDetector, OnlineDetector, SimpleDetector,
};
use crate::types::{alarm_confidence, ChangePoint, ChangePointResult, ChangeType, ResetKind};
use robust_core::numeric::{ensure_finite, ensure_non_negative, ensure_positive};
use robust_core::{guard_range, guard_underflow, DensityProvider, Error, GaussianDensity, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Mean and the two standard deviations the filter scores samples against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegimeSpec")]
pub struct RegimeParams {
    mean: f64,
    sigma_low: f64,
    sigma_high: f64,
}

/// Unvalidated wire form of [`RegimeParams`]
#[derive(Deserialize)]
struct RegimeSpec {
    mean: f64,
    sigma_low: f64,
    sigma_high: f64,
}

impl TryFrom<RegimeSpec> for RegimeParams {
    type Error = Error;

    fn try_from(spec: RegimeSpec) -> Result<Self> {
        Self::new(spec.mean, spec.sigma_low, spec.sigma_high)
    }
}

fn ensure_finite_peak(name: &str, sigma: f64) -> Result<f64> {
    ensure_positive(name, sigma)?;
    let peak = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
    if peak.is_finite() {
        Ok(sigma)
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} = {sigma} is too small: peak density overflows"
        )))
    }
}

impl Default for RegimeParams {
    fn default() -> Self {
        Self {
            mean: 0.0,
            sigma_low: 1.0,
            sigma_high: 3.0,
        }
    }
}

impl RegimeParams {
    /// Validated regime: finite mean, strictly positive sigmas
    ///
    /// A sigma so small that the peak density `1 / (sigma * sqrt(2π))`
    /// overflows is rejected. `sigma_high` is not required to exceed
    /// `sigma_low`.
    pub fn new(mean: f64, sigma_low: f64, sigma_high: f64) -> Result<Self> {
        Ok(Self {
            mean: ensure_finite("mean", mean)?,
            sigma_low: ensure_finite_peak("sigma_low", sigma_low)?,
            sigma_high: ensure_finite_peak("sigma_high", sigma_high)?,
        })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sigma_low(&self) -> f64 {
        self.sigma_low
    }

    pub fn sigma_high(&self) -> f64 {
        self.sigma_high
    }

    /// Same sigmas around another mean
    pub fn with_mean(self, mean: f64) -> Result<Self> {
        Self::new(mean, self.sigma_low, self.sigma_high)
    }
}

/// Prior weights of the (hypothesis, regime) pairs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Priors {
    /// Null, low variance
    pub h0: f64,
    /// Null, high variance
    pub h1: f64,
    /// Alternative, low variance
    pub k0: f64,
    /// Alternative, high variance
    pub k1: f64,
}

impl Default for Priors {
    fn default() -> Self {
        Self {
            h0: 1.0,
            h1: 0.0,
            k0: 0.5,
            k1: 0.5,
        }
    }
}

impl Priors {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("prior h0", self.h0)?;
        ensure_non_negative("prior h1", self.h1)?;
        ensure_non_negative("prior k0", self.k0)?;
        ensure_non_negative("prior k1", self.k1)?;
        if self.h0 + self.h1 + self.k0 + self.k1 <= 0.0 {
            return Err(Error::InvalidParameter(
                "priors must not all be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Regime transition coefficients of the Alternative hypothesis
///
/// `t00`/`t01` weight the low/high state into the new low state, `t10`/`t11`
/// weight the new low state and the previous high state into the new high
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionCoefficients {
    pub t00: f64,
    pub t01: f64,
    pub t10: f64,
    pub t11: f64,
}

impl Default for TransitionCoefficients {
    fn default() -> Self {
        Self {
            t00: 1.0,
            t01: 0.0,
            t10: 0.5,
            t11: 0.5,
        }
    }
}

impl TransitionCoefficients {
    pub fn validate(&self) -> Result<()> {
        ensure_non_negative("transition t00", self.t00)?;
        ensure_non_negative("transition t01", self.t01)?;
        ensure_non_negative("transition t10", self.t10)?;
        ensure_non_negative("transition t11", self.t11)?;
        Ok(())
    }
}

/// Everything the forward filter needs beyond the CUSUM threshold
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HmmParameters {
    pub regime: RegimeParams,
    pub priors: Priors,
    pub transitions: TransitionCoefficients,
}

impl HmmParameters {
    pub fn new(regime: RegimeParams) -> Self {
        Self {
            regime,
            ..Self::default()
        }
    }

    pub fn with_priors(mut self, priors: Priors) -> Self {
        self.priors = priors;
        self
    }

    pub fn with_transitions(mut self, transitions: TransitionCoefficients) -> Self {
        self.transitions = transitions;
        self
    }

    /// Check priors and transitions; the regime is validated when it is built
    pub fn validate(&self) -> Result<()> {
        self.priors.validate()?;
        self.transitions.validate()
    }
}

/// Unnormalized forward probabilities, one per (hypothesis, regime) pair
///
/// Every value is strictly positive and finite: results are kept inside
/// `[MIN_POSITIVE, MAX]` through [`guard_range`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardVars {
    pub h0: f64,
    pub h1: f64,
    pub k0: f64,
    pub k1: f64,
}

impl ForwardVars {
    fn densities<D: DensityProvider>(sample: f64, regime: &RegimeParams, density: &D) -> (f64, f64) {
        let low = guard_underflow(density.density(sample, regime.mean, regime.sigma_low));
        let high = guard_underflow(density.density(sample, regime.mean, regime.sigma_high));
        (low, high)
    }

    /// Prior-weighted densities of a single sample
    pub fn seed<D: DensityProvider>(
        sample: f64,
        regime: &RegimeParams,
        priors: &Priors,
        density: &D,
    ) -> Self {
        let (low, high) = Self::densities(sample, regime, density);
        Self {
            h0: guard_range(priors.h0 * low),
            h1: guard_range(priors.h1 * high),
            k0: guard_range(priors.k0 * low),
            k1: guard_range(priors.k1 * high),
        }
    }

    /// One step of the forward recursion
    pub fn advance<D: DensityProvider>(
        &self,
        sample: f64,
        regime: &RegimeParams,
        t: &TransitionCoefficients,
        density: &D,
    ) -> Self {
        let (low, high) = Self::densities(sample, regime, density);
        let denom_h = guard_underflow(self.null_mass());
        let denom_k = guard_underflow(self.alt_mass());

        // shares of the previous mass, each in [0, 1]
        let share_h1 = self.h1 / denom_h;
        let share_k0 = self.k0 / denom_k;
        let share_k1 = self.k1 / denom_k;

        let h0 = guard_range(low);
        let h1 = guard_range(share_h1 * high);
        let k0 = guard_range((share_k0 * t.t00 + share_k1 * t.t01) * low);
        // the new apK0 is not a share, so it is divided by the old mass here
        let k1 = guard_range(k0 * t.t10 / denom_k * high + share_k1 * t.t11 * high);
        Self { h0, h1, k0, k1 }
    }

    /// Mass under the Null hypothesis, saturating at `f64::MAX`
    pub fn null_mass(&self) -> f64 {
        (self.h0 + self.h1).min(f64::MAX)
    }

    /// Mass under the Alternative hypothesis, saturating at `f64::MAX`
    pub fn alt_mass(&self) -> f64 {
        (self.k0 + self.k1).min(f64::MAX)
    }
}

/// Deferred reset armed by the previous call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorPhase {
    /// No reset pending
    #[default]
    Accumulating,
    /// `llr` fell below zero: re-seed the filter after the next recursion
    ArmedResetFloor,
    /// `llr` passed the threshold: skip the next recursion, re-seed the filter and both ratios
    ArmedResetCeil,
}

/// Outcome of one [`HmmSpikeDetector::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HmmStep {
    /// `llr` passed the threshold on this sample
    pub detected: bool,
    /// Deferred reset consumed on this sample
    pub reset: Option<ResetKind>,
}

impl HmmStep {
    pub fn did_reset(&self) -> bool {
        self.reset.is_some()
    }
}

/// Online spike detector
///
/// Holds an [`AdaptiveCusumDetector`] for its threshold configuration and
/// runs the forward filter on top of it.
#[derive(Clone)]
pub struct HmmSpikeDetector<D: DensityProvider = GaussianDensity, O: DetectionObserver = NullObserver> {
    cusum: AdaptiveCusumDetector,
    params: HmmParameters,
    density: D,
    forward: ForwardVars,
    llr: f64,
    llrr: f64,
    phase: DetectorPhase,
    low_threshold: f64,
    seed_sample: f64,
    samples_seen: usize,
    observer: O,
}

impl<D: DensityProvider, O: DetectionObserver> fmt::Debug for HmmSpikeDetector<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmmSpikeDetector")
            .field("density", &self.density.name())
            .field("params", &self.params)
            .field("forward", &self.forward)
            .field("llr", &self.llr)
            .field("llrr", &self.llrr)
            .field("phase", &self.phase)
            .field("samples_seen", &self.samples_seen)
            .finish()
    }
}

impl HmmSpikeDetector<GaussianDensity, NullObserver> {
    /// Create a detector whose filter is seeded from `first_sample`
    ///
    /// The seed sample is not counted as processed; feed it again through
    /// [`update`](Self::update) if it belongs to the stream.
    pub fn new(cusum: CusumParameters, params: HmmParameters, first_sample: f64) -> Result<Self> {
        Self::with_parts(cusum, params, first_sample, GaussianDensity, NullObserver)
    }
}

impl<D: DensityProvider> HmmSpikeDetector<D, NullObserver> {
    /// Create a detector evaluating densities through `density`
    pub fn with_density(
        cusum: CusumParameters,
        params: HmmParameters,
        first_sample: f64,
        density: D,
    ) -> Result<Self> {
        Self::with_parts(cusum, params, first_sample, density, NullObserver)
    }
}

impl<D: DensityProvider, O: DetectionObserver> HmmSpikeDetector<D, O> {
    /// Create a detector from all of its parts
    #[instrument(level = "debug", skip(density, observer), fields(provider = density.name()))]
    pub fn with_parts(
        cusum: CusumParameters,
        params: HmmParameters,
        first_sample: f64,
        density: D,
        observer: O,
    ) -> Result<Self> {
        params.validate()?;
        ensure_finite("first_sample", first_sample)?;
        let cusum = AdaptiveCusumDetector::new(cusum)?;
        let forward = ForwardVars::seed(first_sample, &params.regime, &params.priors, &density);
        tracing::debug!(?forward, "seeded forward variables");

        Ok(Self {
            low_threshold: cusum.threshold(),
            cusum,
            params,
            density,
            forward,
            llr: 0.0,
            llrr: 0.0,
            phase: DetectorPhase::Accumulating,
            seed_sample: first_sample,
            samples_seen: 0,
            observer,
        })
    }

    /// Feed one sample scored against the configured regime
    pub fn update(&mut self, sample: f64) -> HmmStep {
        let regime = self.params.regime;
        self.update_with(sample, &regime)
    }

    /// Feed one sample scored against `regime`
    ///
    /// The regime is used for this call only, including any re-seeding it
    /// performs. A NaN or infinite sample is dropped: no state changes, it is
    /// not counted, and the returned step is empty.
    pub fn update_with(&mut self, sample: f64, regime: &RegimeParams) -> HmmStep {
        if !sample.is_finite() {
            tracing::warn!(sample, index = self.samples_seen, "skipping non-finite sample");
            return HmmStep::default();
        }

        let index = self.samples_seen;
        self.samples_seen += 1;
        let phase = self.phase;

        if phase != DetectorPhase::ArmedResetCeil {
            self.forward = self
                .forward
                .advance(sample, regime, &self.params.transitions, &self.density);
            let ln_null = self.forward.null_mass().ln();
            let ln_alt = self.forward.alt_mass().ln();
            self.llr += ln_alt - ln_null;
            self.llrr += ln_null - ln_alt;
        }

        let reset = match phase {
            DetectorPhase::Accumulating => None,
            DetectorPhase::ArmedResetFloor => {
                self.initialize_forward_vars(sample, regime);
                Some(ResetKind::Floor)
            }
            DetectorPhase::ArmedResetCeil => {
                self.initialize_forward_vars(sample, regime);
                self.reset_llr();
                Some(ResetKind::Ceil)
            }
        };
        if let Some(kind) = reset {
            self.emit(DetectionEvent::ForwardReset { index, kind, sample });
        }

        let threshold = self.threshold();
        let mut detected = false;
        self.phase = DetectorPhase::Accumulating;
        if self.llr > threshold {
            self.phase = DetectorPhase::ArmedResetCeil;
            detected = true;
            tracing::debug!(index, llr = self.llr, threshold, "spike detected");
            self.emit(DetectionEvent::SpikeDetected { index, llr: self.llr });
        } else if self.llr < 0.0 {
            self.phase = DetectorPhase::ArmedResetFloor;
            self.llr = 0.0;
        }
        if self.llrr < 0.0 {
            self.llrr = 0.0;
        }

        tracing::trace!(index, sample, llr = self.llr, llrr = self.llrr, phase = ?self.phase, "hmm update");
        HmmStep { detected, reset }
    }

    /// Re-seed the forward variables from `sample` using the priors
    pub fn initialize_forward_vars(&mut self, sample: f64, regime: &RegimeParams) {
        self.forward = ForwardVars::seed(sample, regime, &self.params.priors, &self.density);
    }

    /// Zero both accumulated ratios
    pub fn reset_llr(&mut self) {
        self.llr = 0.0;
        self.llrr = 0.0;
    }

    fn emit(&mut self, event: DetectionEvent) {
        if self.observer.is_enabled() {
            self.observer.on_event(&event);
        }
    }

    pub fn forward_vars(&self) -> ForwardVars {
        self.forward
    }

    /// Accumulated log-likelihood ratio of Alternative over Null
    pub fn llr(&self) -> f64 {
        self.llr
    }

    /// Accumulated log-likelihood ratio of Null over Alternative
    pub fn llrr(&self) -> f64 {
        self.llrr
    }

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    /// Detection threshold `h`, shared with the composed CUSUM configuration
    pub fn threshold(&self) -> f64 {
        self.cusum.threshold()
    }

    /// Threshold recorded at construction
    pub fn low_threshold(&self) -> f64 {
        self.low_threshold
    }

    pub fn regime(&self) -> &RegimeParams {
        &self.params.regime
    }

    pub fn cusum(&self) -> &AdaptiveCusumDetector {
        &self.cusum
    }

    pub fn density(&self) -> &D {
        &self.density
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
}

impl<D: DensityProvider, O: DetectionObserver> fmt::Display for HmmSpikeDetector<D, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "apH0: {} apH1: {} apK0: {} apK1: {}\nLLR: {} LLRR: {}",
            self.forward.h0, self.forward.h1, self.forward.k0, self.forward.k1, self.llr, self.llrr
        )
    }
}

impl<D: DensityProvider, O: DetectionObserver> ChangePointDetectorProperties for HmmSpikeDetector<D, O> {
    fn algorithm_name(&self) -> &'static str {
        "HMM Spike"
    }

    fn minimum_sample_size(&self) -> usize {
        1
    }
}

impl<D: DensityProvider, O: DetectionObserver> OnlineDetector for HmmSpikeDetector<D, O> {
    type Output = HmmStep;

    fn process_point(&mut self, value: f64) -> Self::Output {
        self.update(value)
    }

    /// Re-seed from the construction sample and zero both ratios
    fn reset(&mut self) {
        let regime = self.params.regime;
        self.initialize_forward_vars(self.seed_sample, &regime);
        self.reset_llr();
        self.phase = DetectorPhase::Accumulating;
        self.samples_seen = 0;
    }

    fn current_index(&self) -> usize {
        self.samples_seen
    }
}

impl<D: DensityProvider, O: DetectionObserver> SimpleDetector for HmmSpikeDetector<D, O> {
    /// Seeds a fresh filter from the first value and feeds the rest
    ///
    /// Every detection is a [`ChangeType::Spike`] changepoint. The statistics
    /// trace holds `llr` after each sample; the seed position reads zero.
    fn detect_simple(&self, sample: &[f64]) -> Result<ChangePointResult> {
        let Some((&first, rest)) = sample.split_first() else {
            return Err(Error::InsufficientData {
                expected: self.minimum_sample_size(),
                actual: 0,
            });
        };

        let mut replay = HmmSpikeDetector::with_density(
            *self.cusum.parameters(),
            self.params,
            first,
            self.density.clone(),
        )?;
        let threshold = replay.threshold();
        let mut changepoints = Vec::new();
        let mut trace = Vec::with_capacity(sample.len());
        trace.push(0.0);

        for (offset, &x) in rest.iter().enumerate() {
            let step = replay.update(x);
            if step.detected {
                changepoints.push(ChangePoint::with_type(
                    offset + 1,
                    alarm_confidence(replay.llr(), threshold),
                    ChangeType::Spike,
                ));
            }
            trace.push(replay.llr());
        }

        Ok(ChangePointResult::new(
            changepoints,
            self.algorithm_name().to_string(),
            sample.len(),
            trace,
        ))
    }
}

impl<D: DensityProvider, O: DetectionObserver> ConfigurableDetector for HmmSpikeDetector<D, O> {
    type Parameters = HmmParameters;

    fn parameters(&self) -> &Self::Parameters {
        &self.params
    }

    /// Installs the new filter configuration and re-seeds from the construction sample
    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        OnlineDetector::reset(self);
        Ok(())
    }
}
