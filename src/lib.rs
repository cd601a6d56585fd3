//! Sequential change detection for scalar streams
//!
//! This crate re-exports the workspace crates under one name:
//!
//! - [`robust_core`]: errors, numeric guards, density evaluation and batch helpers
//! - [`robust_changepoint`]: the online CUSUM, adaptive CUSUM and HMM spike detectors
//!
//! # Example
//!
//! ```rust
//! use robust_sequential::prelude::*;
//!
//! let config = SpikeDetectorConfig::default();
//! let mut detector = config.build_adaptive().unwrap();
//! for x in [0.0, 0.2, -0.1, 3.0, 3.1, 2.9, 3.0] {
//!     detector.update(x);
//! }
//! assert!(detector.mean() > 0.0);
//! ```

pub use robust_changepoint;
pub use robust_core;

pub use robust_changepoint::{
    AdaptiveCusumDetector, CusumDetector, CusumParameters, HmmParameters, HmmSpikeDetector,
    SpikeDetectorConfig,
};
pub use robust_core::{Error, Result};

/// Everything needed to configure and drive the detectors
pub mod prelude {
    pub use robust_changepoint::{
        AdaptiveCusumDetector, AlarmDirection, ChangePointResult, CusumDetector, CusumParameters,
        DetectionEvent, DetectionObserver, HmmParameters, HmmSpikeDetector, HmmStep,
        LoggingObserver, NullObserver, OnlineDetector, RecordingObserver, RegimeParams,
        SimpleDetector, SpikeDetectorConfig,
    };
    pub use robust_core::prelude::*;
}
