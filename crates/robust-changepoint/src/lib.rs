//! Online changepoint and spike detection
//!
//! Detectors in this crate are fed one sample at a time and keep all of their
//! state in a single owned struct, one instance per monitored stream.
//!
//! # Algorithms
//!
//! - **CUSUM** ([`CusumDetector`]): two one-sided cumulative sums that raise an
//!   alarm when the mean moves by at least `delta`
//! - **Adaptive CUSUM** ([`AdaptiveCusumDetector`]): moves its baseline onto the
//!   crossed reference value after every alarm, so it tracks level shifts
//! - **HMM spike** ([`HmmSpikeDetector`]): a forward filter over a low- and a
//!   high-variance regime whose log-likelihood ratio flags short excursions
//!
//! Diagnostics are delivered through a [`DetectionObserver`] type parameter
//! that defaults to the zero-cost [`NullObserver`].
//!
//! ## Usage
//!
//! ```rust
//! use robust_changepoint::{AdaptiveCusumDetector, CusumParameters, SimpleDetector};
//!
//! // Level shift from 0 to 5 halfway through
//! let data: Vec<f64> = (0..50).map(|i| if i < 25 { 0.0 } else { 5.0 }).collect();
//!
//! let params = CusumParameters::new(0.0, 2.0, 5.0).unwrap();
//! let mut detector = AdaptiveCusumDetector::new(params).unwrap();
//! let result = detector.detect_simple(&data).unwrap();
//! assert_eq!(result.changepoints()[0].index, 26);
//!
//! for &x in &data {
//!     if let Some(step) = detector.update(x) {
//!         println!("baseline {} -> {}", step.previous_mean, step.new_mean);
//!     }
//! }
//! ```

pub mod adaptive;
pub mod config;
pub mod cusum;
pub mod hmm;
pub mod observer;
pub mod traits;
pub mod types;

pub use adaptive::AdaptiveCusumDetector;
pub use config::SpikeDetectorConfig;
pub use cusum::{CusumDetector, CusumParameters, CusumState};
pub use hmm::{
    DetectorPhase, ForwardVars, HmmParameters, HmmSpikeDetector, HmmStep, Priors, RegimeParams,
    TransitionCoefficients,
};
pub use observer::{DetectionEvent, DetectionObserver, LoggingObserver, NullObserver, RecordingObserver};
pub use traits::{ChangePointDetectorProperties, ConfigurableDetector, OnlineDetector, SimpleDetector};
pub use types::{AlarmDirection, ChangePoint, ChangePointResult, ChangeType, Rebaseline, ResetKind};
