//! Property-based tests for the online detectors
//!
//! These check the invariants that must hold for every configuration and
//! every input stream, not just the hand-picked scenarios of the unit tests.

use proptest::prelude::*;
use robust_changepoint::{
    AdaptiveCusumDetector, CusumDetector, CusumParameters, DetectorPhase, ForwardVars,
    HmmParameters, HmmSpikeDetector, Priors, RegimeParams, ResetKind,
};
use robust_core::GaussianDensity;

fn hmm_detector(h: f64, sigma_low: f64, sigma_high: f64, first: f64) -> HmmSpikeDetector {
    let cusum = CusumParameters::new(0.0, 1.0, h).unwrap();
    let regime = RegimeParams::new(0.0, sigma_low, sigma_high).unwrap();
    HmmSpikeDetector::new(cusum, HmmParameters::new(regime), first).unwrap()
}

proptest! {
    // Property: a stream sitting exactly on the baseline never accumulates
    #[test]
    fn prop_constant_stream_keeps_sums_at_zero(
        mean in -1000.0..1000.0f64,
        delta in 0.1..10.0f64,
        threshold in 0.0..20.0f64,
        len in 1usize..200,
    ) {
        let mut detector = CusumDetector::new(CusumParameters::new(mean, delta, threshold).unwrap()).unwrap();
        for _ in 0..len {
            prop_assert_eq!(detector.update(mean), None);
            prop_assert_eq!(detector.upper_sum(), 0.0);
            prop_assert_eq!(detector.lower_sum(), 0.0);
        }
    }

    // Property: a step of delta + eps alarms on the first n with n * (k + eps) > h
    #[test]
    fn prop_step_alarms_after_computable_delay(
        mean in -100i32..100,
        half_delta in 1i32..4,
        eps in 1i32..4,
        threshold in 0i32..50,
    ) {
        let k = half_delta as f64;
        let eps = eps as f64;
        let h = threshold as f64;
        let params = CusumParameters::new(mean as f64, 2.0 * k, h).unwrap();
        let mut detector = CusumDetector::new(params).unwrap();
        let sample = mean as f64 + 2.0 * k + eps;
        let expected = (h / (k + eps)).floor() as usize + 1;

        for n in 1..expected {
            prop_assert_eq!(detector.update(sample), None, "early alarm at sample {}", n);
        }
        prop_assert!(detector.update(sample).is_some());
        prop_assert!(detector.upper_alarm());
        prop_assert!(!detector.lower_alarm());
    }

    // Property: sums never go negative and flags always match the sums
    #[test]
    fn prop_cusum_state_consistent(
        samples in prop::collection::vec(-50.0..50.0f64, 1..300),
        threshold in 0.0..10.0f64,
    ) {
        let mut detector = CusumDetector::new(CusumParameters::new(0.0, 1.0, threshold).unwrap()).unwrap();
        for x in samples {
            detector.update(x);
            let state = detector.state();
            prop_assert!(state.upper_sum >= 0.0);
            prop_assert!(state.lower_sum >= 0.0);
            prop_assert_eq!(state.upper_alarm, threshold < state.upper_sum);
            prop_assert_eq!(state.lower_alarm, threshold < state.lower_sum);
        }
    }

    // Property: every rebaseline moves the mean by exactly k and clears the sums
    #[test]
    fn prop_adaptive_rebaseline_moves_by_k(
        samples in prop::collection::vec(-20.0..20.0f64, 1..300),
        delta in 0.5..4.0f64,
        threshold in 0.0..10.0f64,
    ) {
        let params = CusumParameters::new(0.0, delta, threshold).unwrap();
        let mut detector = AdaptiveCusumDetector::new(params).unwrap();
        let k = params.k();
        for x in samples {
            if let Some(step) = detector.update(x) {
                prop_assert!(
                    step.new_mean == step.previous_mean + k || step.new_mean == step.previous_mean - k
                );
                prop_assert_eq!(detector.mean(), step.new_mean);
                prop_assert_eq!(detector.cusum().upper_sum(), 0.0);
                prop_assert_eq!(detector.cusum().lower_sum(), 0.0);
                prop_assert!(!detector.alarm());
            }
        }
    }

    // Property: forward variables stay strictly positive and finite, ratios stay clamped.
    // Sigmas are log-uniform down to 1e-150 and samples often sit on the mean.
    #[test]
    fn prop_forward_vars_positive_and_finite(
        samples in prop::collection::vec(prop_oneof![Just(0.0), -50.0..50.0f64], 1..300),
        first in prop_oneof![Just(0.0), -50.0..50.0f64],
        low_exp in -150.0..0.7f64,
        high_exp in -150.0..1.3f64,
        h in 0.0..30.0f64,
    ) {
        let sigma_low = 10f64.powf(low_exp);
        let sigma_high = 10f64.powf(high_exp);
        let mut detector = hmm_detector(h, sigma_low, sigma_high, first);
        for x in samples {
            detector.update(x);
            let fwd = detector.forward_vars();
            for v in [fwd.h0, fwd.h1, fwd.k0, fwd.k1] {
                prop_assert!(v > 0.0 && v.is_finite(), "forward variable {} out of range", v);
            }
            prop_assert!(detector.llr() >= 0.0 && detector.llr().is_finite());
            prop_assert!(detector.llrr() >= 0.0 && detector.llrr().is_finite());
        }
    }

    // Property: a detection is followed by a ceil reset that reproduces the seed
    #[test]
    fn prop_detection_then_reseed(
        samples in prop::collection::vec(-30.0..30.0f64, 2..300),
        h in 0.0..15.0f64,
    ) {
        let mut detector = hmm_detector(h, 1.0, 5.0, 0.0);
        let regime = *detector.regime();
        let priors = Priors::default();
        let mut previous_detected = false;

        for x in samples {
            let step = detector.update(x);
            if previous_detected {
                prop_assert!(!step.detected);
                prop_assert_eq!(step.reset, Some(ResetKind::Ceil));
                prop_assert_eq!(detector.forward_vars(), ForwardVars::seed(x, &regime, &priors, &GaussianDensity));
                prop_assert_eq!(detector.llr(), 0.0);
                prop_assert_eq!(detector.llrr(), 0.0);
                prop_assert_eq!(detector.phase(), DetectorPhase::Accumulating);
            }
            if step.detected {
                prop_assert!(detector.llr() > h);
                prop_assert_eq!(detector.phase(), DetectorPhase::ArmedResetCeil);
            }
            previous_detected = step.detected;
        }
    }
}
