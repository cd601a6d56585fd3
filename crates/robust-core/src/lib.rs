//! Core types and helpers for sequential change detection
//!
//! This crate holds everything the detectors in `robust-changepoint` consume
//! but that carries no sequential decision logic of its own:
//!
//! - [`error`]: the shared [`Error`] type and [`Result`] alias
//! - [`numeric`]: the underflow guard applied at every division and logarithm
//!   site of the forward recursions, plus parameter validators
//! - [`density`]: the [`DensityProvider`] seam and the `statrs`-backed
//!   [`GaussianDensity`]
//! - [`utils`]: batch estimators used to choose a baseline before streaming
//! - [`preprocess`]: batch transforms (spike removal, mean-centering, scaling)
//!
//! # Example
//!
//! ```rust
//! use robust_core::{utils, DensityProvider, GaussianDensity};
//!
//! let calibration = [9.8, 10.1, 10.0, 9.9, 10.2];
//! let baseline = utils::first_n_mean(&calibration, 5);
//! let peak = GaussianDensity.density(baseline, baseline, 0.5);
//! assert!(peak > 0.0);
//! ```

pub mod density;
pub mod error;
pub mod numeric;
pub mod preprocess;
pub mod utils;

// Re-export core types
pub use density::{log_likelihood_ratio, DensityProvider, FnDensity, GaussianDensity};
pub use error::{Error, Result};
pub use numeric::{guard_range, guard_underflow};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::density::{DensityProvider, GaussianDensity};
    pub use crate::error::Error;
    pub use crate::numeric::{guard_range, guard_underflow};
    pub use crate::Result;
}
