//! Normal density evaluation
//!
//! Detectors never evaluate densities directly; they go through a
//! [`DensityProvider`] so tests and embedding applications can substitute
//! their own evaluator. [`GaussianDensity`] is the default and is backed by
//! `statrs`.

use crate::error::Result;
use crate::numeric::ensure_positive;
use statrs::distribution::{Continuous, Normal};

/// Evaluates a probability density for a sample under N(mean, sigma²)
///
/// Implementations must be pure: the same arguments always yield the same
/// value. A return value of exactly zero is allowed (floating underflow far in
/// the tails); consumers apply [`crate::numeric::guard_underflow`].
pub trait DensityProvider: Clone + Send + Sync {
    /// Density of `x` under a normal distribution with the given parameters
    fn density(&self, x: f64, mean: f64, sigma: f64) -> f64;

    /// Name used in diagnostics
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Normal density from `statrs`
///
/// Parameters that `statrs` rejects (NaN mean, non-positive sigma) evaluate to
/// zero rather than panicking. Detector configuration already refuses such
/// values, so this only matters for callers using the provider on its own.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GaussianDensity;

impl DensityProvider for GaussianDensity {
    #[inline]
    fn density(&self, x: f64, mean: f64, sigma: f64) -> f64 {
        match Normal::new(mean, sigma) {
            Ok(normal) => normal.pdf(x),
            Err(err) => {
                log::trace!("density with mean={mean}, sigma={sigma} rejected: {err}");
                0.0
            }
        }
    }

    fn name(&self) -> &'static str {
        "gaussian"
    }
}

/// Adapter turning a plain function into a [`DensityProvider`]
///
/// ```rust
/// use robust_core::density::{DensityProvider, FnDensity};
///
/// let flat = FnDensity::new(|_x: f64, _mean: f64, _sigma: f64| 0.5);
/// assert_eq!(flat.density(3.0, 0.0, 1.0), 0.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnDensity<F> {
    func: F,
}

impl<F> FnDensity<F>
where
    F: Fn(f64, f64, f64) -> f64 + Clone + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> DensityProvider for FnDensity<F>
where
    F: Fn(f64, f64, f64) -> f64 + Clone + Send + Sync,
{
    #[inline]
    fn density(&self, x: f64, mean: f64, sigma: f64) -> f64 {
        (self.func)(x, mean, sigma)
    }
}

/// Log-likelihood ratio of `x` under a wider alternative variance
///
/// Both hypotheses share `mean`; the result is
/// `ln(pdf(x; mean, sigma_alt) / pdf(x; mean, sigma_base))`. Evaluated in log
/// space so it stays finite where the densities themselves underflow.
///
/// # Examples
///
/// ```rust
/// use robust_core::density::log_likelihood_ratio;
///
/// // Equal variances carry no evidence either way
/// assert_eq!(log_likelihood_ratio(1.3, 0.0, 2.0, 2.0).unwrap(), 0.0);
/// // Far in the tail the wide alternative is favoured
/// assert!(log_likelihood_ratio(8.0, 0.0, 1.0, 4.0).unwrap() > 0.0);
/// ```
pub fn log_likelihood_ratio(x: f64, mean: f64, sigma_base: f64, sigma_alt: f64) -> Result<f64> {
    ensure_positive("sigma_base", sigma_base)?;
    ensure_positive("sigma_alt", sigma_alt)?;
    let base = Normal::new(mean, sigma_base).map_err(anyhow::Error::from)?;
    let alt = Normal::new(mean, sigma_alt).map_err(anyhow::Error::from)?;
    Ok(alt.ln_pdf(x) - base.ln_pdf(x))
}
