//! End-to-end monitoring of a simulated sensor stream
//!
//! A baseline is estimated from a calibration window, the detectors are built
//! from a JSON configuration, and alarms are reported through observers with a
//! `tracing` subscriber installed.

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use robust_sequential::prelude::*;
use robust_sequential::robust_core::{preprocess, utils};

const LEVEL: f64 = 10.0;
const NOISE: f64 = 0.5;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn sensor(rng: &mut ChaCha8Rng, level: f64, n: usize) -> Vec<f64> {
    let noise = Normal::new(level, NOISE).unwrap();
    (0..n).map(|_| noise.sample(rng)).collect()
}

/// Calibration window with a few dropouts reading zero
fn calibration(rng: &mut ChaCha8Rng) -> Vec<f64> {
    let mut data = sensor(rng, LEVEL, 100);
    for i in [7, 33, 71] {
        data[i] = 0.0;
    }
    data
}

fn config_for(baseline: f64) -> anyhow::Result<SpikeDetectorConfig> {
    let json = format!(
        r#"{{
            "cusum": {{ "mean": {baseline}, "delta": 1.0, "threshold": 8.0 }},
            "hmm": {{ "regime": {{ "mean": {baseline}, "sigma_low": 0.5, "sigma_high": 2.5 }} }}
        }}"#
    );
    Ok(SpikeDetectorConfig::from_json_str(&json)?)
}

#[test]
fn test_calibrated_baseline_ignores_dropouts() -> anyhow::Result<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let raw = calibration(&mut rng);

    let naive = utils::first_n_mean(&raw, raw.len());
    let cleaned = preprocess::remove_spikes(&raw, LEVEL / 2.0)?;
    let baseline = utils::first_n_mean(&cleaned, cleaned.len());

    assert!(naive < LEVEL - 0.1);
    assert_abs_diff_eq!(baseline, LEVEL, epsilon = 0.2);
    Ok(())
}

#[test]
fn test_level_shift_reported_through_logging_observer() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let cleaned = preprocess::remove_spikes(&calibration(&mut rng), LEVEL / 2.0)?;
    let config = config_for(utils::mean(&cleaned))?;

    let mut stream = sensor(&mut rng, LEVEL, 200);
    stream.extend(sensor(&mut rng, LEVEL + 2.0, 200));

    let observer = LoggingObserver::new("sensor-1");
    let mut detector = AdaptiveCusumDetector::with_observer(config.cusum, observer)?;
    let moves: Vec<(usize, f64)> = stream
        .iter()
        .enumerate()
        .filter_map(|(i, &x)| detector.update(x).map(|step| (i, step.new_mean)))
        .collect();

    let (first, _) = moves[0];
    assert!((200..=215).contains(&first), "first rebaseline at {first}");
    assert!(moves
        .iter()
        .all(|&(_, mean)| mean > config.cusum.mean));
    assert!(detector.mean() > LEVEL + 1.0);
    assert_eq!(detector.observer().stream(), "sensor-1");
    Ok(())
}

#[test]
fn test_spikes_recorded_with_reset_events() -> anyhow::Result<()> {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let cleaned = preprocess::remove_spikes(&calibration(&mut rng), LEVEL / 2.0)?;
    let config = config_for(utils::mean(&cleaned))?;

    let mut stream = sensor(&mut rng, LEVEL, 300);
    for i in [60, 180] {
        stream[i] = LEVEL + 6.0;
    }

    let mut detector = HmmSpikeDetector::with_parts(
        config.cusum,
        config.hmm,
        stream[0],
        GaussianDensity,
        RecordingObserver::new(),
    )?;
    for &x in &stream[1..] {
        detector.update(x);
    }

    let events = detector.into_observer().take();
    let spikes: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            DetectionEvent::SpikeDetected { index, .. } => Some(*index + 1),
            _ => None,
        })
        .collect();
    assert_eq!(spikes, vec![60, 180]);

    // each detection is followed by a ceil reset on the next sample
    let ceil_resets = events
        .iter()
        .filter(|event| {
            matches!(
                event,
                DetectionEvent::ForwardReset {
                    kind: robust_sequential::robust_changepoint::ResetKind::Ceil,
                    ..
                }
            )
        })
        .count();
    assert_eq!(ceil_resets, 2);
    Ok(())
}

#[test]
fn test_independent_streams_in_parallel() {
    let config = SpikeDetectorConfig::from_json_str(
        r#"{ "cusum": { "mean": 0.0, "delta": 2.0, "threshold": 5.0 } }"#,
    )
    .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|shift| {
            std::thread::spawn(move || {
                let mut detector = config.build_adaptive().unwrap();
                for _ in 0..20 {
                    detector.update(shift as f64 * 3.0);
                }
                detector.mean()
            })
        })
        .collect();

    let means: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(means[0], 0.0);
    assert!(means.windows(2).all(|w| w[1] > w[0]));
}
