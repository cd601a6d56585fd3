//! Detector configuration loaded from JSON
//!
//! ```rust
//! use robust_changepoint::SpikeDetectorConfig;
//!
//! let config = SpikeDetectorConfig::from_json_str(
//!     r#"{
//!         "cusum": { "mean": 10.0, "delta": 2.0, "threshold": 5.0 },
//!         "hmm": { "regime": { "mean": 10.0, "sigma_low": 0.5, "sigma_high": 4.0 } }
//!     }"#,
//! )
//! .unwrap();
//!
//! let mut detector = config.build_hmm(10.0).unwrap();
//! assert!(!detector.update(10.1).detected);
//! ```

use crate::adaptive::AdaptiveCusumDetector;
use crate::cusum::{CusumDetector, CusumParameters};
use crate::hmm::{HmmParameters, HmmSpikeDetector};
use robust_core::Result;
use serde::{Deserialize, Serialize};

/// Configuration shared by all three detectors of a stream
///
/// Missing sections fall back to their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeDetectorConfig {
    pub cusum: CusumParameters,
    pub hmm: HmmParameters,
}

impl SpikeDetectorConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        tracing::debug!(?config, "loaded detector configuration");
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.cusum.validate()?;
        self.hmm.validate()
    }

    pub fn build_cusum(&self) -> Result<CusumDetector> {
        CusumDetector::new(self.cusum)
    }

    pub fn build_adaptive(&self) -> Result<AdaptiveCusumDetector> {
        AdaptiveCusumDetector::new(self.cusum)
    }

    /// Build a spike detector seeded from `first_sample`
    pub fn build_hmm(&self, first_sample: f64) -> Result<HmmSpikeDetector> {
        HmmSpikeDetector::new(self.cusum, self.hmm, first_sample)
    }
}
