//! Batch preprocessing applied to a recording before it is streamed
//!
//! Spikes here are downward dropouts: samples below a threshold are treated
//! as sensor glitches and replaced by the mean of the remaining samples.

use crate::error::{Error, Result};
use crate::utils::mean;

/// Replace every sample below `threshold` with the mean of the others
///
/// Fails when no sample reaches the threshold, since there is nothing to
/// take the replacement mean from.
///
/// ```rust
/// use robust_core::preprocess::remove_spikes;
///
/// let cleaned = remove_spikes(&[4.0, -50.0, 6.0, 5.0], 0.0).unwrap();
/// assert_eq!(cleaned, vec![4.0, 5.0, 6.0, 5.0]);
/// ```
pub fn remove_spikes(data: &[f64], threshold: f64) -> Result<Vec<f64>> {
    let kept: Vec<f64> = data.iter().copied().filter(|&x| x >= threshold).collect();
    if kept.is_empty() {
        return Err(if data.is_empty() {
            Error::empty_input("remove_spikes")
        } else {
            Error::InvalidInput(format!(
                "all {} samples are below the spike threshold {threshold}",
                data.len()
            ))
        });
    }

    let replacement = mean(&kept);
    let cleaned: Vec<f64> = data
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            if x < threshold {
                log::debug!("replacing spike at index {i} ({x}) with {replacement}");
                replacement
            } else {
                x
            }
        })
        .collect();
    Ok(cleaned)
}

/// Shift the recording so its mean is zero
pub fn normalize_mean_to_zero(data: &[f64]) -> Vec<f64> {
    let m = mean(data);
    data.iter().map(|&x| x - m).collect()
}

/// Multiply every sample by `factor`
pub fn scale(data: &[f64], factor: f64) -> Vec<f64> {
    data.iter().map(|&x| x * factor).collect()
}
