//! Numeric guards shared by every detector
//!
//! Forward-variable recursions divide by, and take logarithms of, products of
//! densities that can underflow to exactly zero. Every such site goes through
//! [`guard_underflow`] so the substitution is identical everywhere.
//!
//! The validation helpers are used by parameter structs when they are built or
//! deserialized.

use crate::error::{Error, Result};
use num_traits::Float;

/// Replace an exact zero by the smallest positive normal value of `F`
///
/// Any other value, including subnormals, is returned untouched.
///
/// # Examples
///
/// ```rust
/// use robust_core::numeric::guard_underflow;
///
/// assert_eq!(guard_underflow(0.0_f64), f64::MIN_POSITIVE);
/// assert_eq!(guard_underflow(0.25_f64), 0.25);
/// assert_eq!(guard_underflow(0.0_f32), f32::MIN_POSITIVE);
/// ```
#[inline]
pub fn guard_underflow<F: Float>(value: F) -> F {
    if value == F::zero() {
        F::min_positive_value()
    } else {
        value
    }
}

/// Keep a non-negative value inside `[MIN_POSITIVE, MAX]`
///
/// Exact zeros go through [`guard_underflow`]; overflow to `+inf` saturates
/// at the largest finite value. NaN is returned untouched.
///
/// ```rust
/// use robust_core::numeric::guard_range;
///
/// assert_eq!(guard_range(0.0_f64), f64::MIN_POSITIVE);
/// assert_eq!(guard_range(f64::INFINITY), f64::MAX);
/// assert_eq!(guard_range(3.5_f64), 3.5);
/// ```
#[inline]
pub fn guard_range<F: Float>(value: F) -> F {
    let value = guard_underflow(value);
    if value > F::max_value() {
        F::max_value()
    } else {
        value
    }
}

/// Require a finite value
pub fn ensure_finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::non_finite(name))
    }
}

/// Require a finite, strictly positive value
pub fn ensure_positive(name: &str, value: f64) -> Result<f64> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(Error::non_positive(name, value))
    }
}

/// Require a finite, non-negative value
pub fn ensure_non_negative(name: &str, value: f64) -> Result<f64> {
    ensure_finite(name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::negative(name, value))
    }
}
