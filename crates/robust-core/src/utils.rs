//! Batch estimators used to pick detector parameters before streaming starts
//!
//! None of these functions take part in sequential decisions. An operator
//! typically runs them over a calibration recording to choose the baseline
//! `mean` and the noise levels handed to a detector.
//!
//! All estimators are total: out-of-range counts and percentages are clamped
//! and empty selections yield `0.0`, matching the behaviour of [`mean`].

use std::cmp::Ordering;

/// Sort data and return a new vector
///
/// Handles NaN values by placing them at the end.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::sorted;
///
/// let data = vec![3.0, 1.0, 5.0, 2.0, 4.0];
/// assert_eq!(sorted(&data), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
/// ```
pub fn sorted(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    });
    sorted
}

/// Calculate the mean of a slice
///
/// Returns 0.0 for empty slices.
///
/// # Examples
///
/// ```rust
/// use robust_core::utils::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
/// assert_eq!(mean(&[]), 0.0);
/// ```
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let sum: f64 = data.iter().sum();
    sum / data.len() as f64
}

/// Mean of the first `n` samples
///
/// `n` larger than the slice is clamped to its length.
///
/// ```rust
/// use robust_core::utils::first_n_mean;
///
/// assert_eq!(first_n_mean(&[2.0, 4.0, 9.0], 2), 3.0);
/// assert_eq!(first_n_mean(&[2.0, 4.0, 9.0], 10), 5.0);
/// assert_eq!(first_n_mean(&[2.0, 4.0, 9.0], 0), 0.0);
/// ```
pub fn first_n_mean(data: &[f64], n: usize) -> f64 {
    if n > data.len() {
        log::debug!("first_n_mean: clamping n={n} to {}", data.len());
    }
    let n = n.min(data.len());
    mean(&data[..n])
}

/// Mean of the leading `percent`% of the samples
///
/// The count is `floor(len * percent / 100)`; a count of zero yields `0.0`.
pub fn first_n_percent(data: &[f64], percent: f64) -> f64 {
    let count = percent_count(data.len(), percent);
    first_n_mean(data, count)
}

/// Mean of the largest `percent`% of the samples
///
/// At least one sample is selected whenever `percent > 0` and the slice is
/// not empty.
///
/// ```rust
/// use robust_core::utils::top_n_percent;
///
/// let data = [5.0, 1.0, 4.0, 2.0, 3.0, 10.0, 6.0, 8.0, 7.0, 9.0];
/// assert_eq!(top_n_percent(&data, 20.0), 9.5);
/// assert_eq!(top_n_percent(&data, 1.0), 10.0);
/// ```
pub fn top_n_percent(data: &[f64], percent: f64) -> f64 {
    match extreme_count(data.len(), percent) {
        Some(count) => {
            let ordered = sorted(data);
            mean(&ordered[ordered.len() - count..])
        }
        None => 0.0,
    }
}

/// Mean of the smallest `percent`% of the samples
///
/// At least one sample is selected whenever `percent > 0` and the slice is
/// not empty.
pub fn bot_n_percent(data: &[f64], percent: f64) -> f64 {
    match extreme_count(data.len(), percent) {
        Some(count) => {
            let ordered = sorted(data);
            mean(&ordered[..count])
        }
        None => 0.0,
    }
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        log::debug!("percentage is NaN, treating as 0");
        return 0.0;
    }
    if !(0.0..=100.0).contains(&percent) {
        log::debug!("clamping percentage {percent} into [0, 100]");
    }
    percent.clamp(0.0, 100.0)
}

fn percent_count(len: usize, percent: f64) -> usize {
    let percent = clamp_percent(percent);
    (len as f64 * percent / 100.0).floor() as usize
}

fn extreme_count(len: usize, percent: f64) -> Option<usize> {
    let percent = clamp_percent(percent);
    if len == 0 || percent == 0.0 {
        return None;
    }
    Some(percent_count(len, percent).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten() -> Vec<f64> {
        vec![5.0, 1.0, 4.0, 2.0, 3.0, 10.0, 6.0, 8.0, 7.0, 9.0]
    }

    #[test]
    fn test_sorted_with_nan() {
        let sorted_data = sorted(&[3.0, f64::NAN, 1.0, 2.0]);
        assert_eq!(&sorted_data[..3], &[1.0, 2.0, 3.0]);
        assert!(sorted_data[3].is_nan());
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[-10.0, 10.0]), 0.0);
        assert_eq!(mean(&[42.0]), 42.0);
    }

    #[test]
    fn test_first_n_mean_clamps() {
        let data = ten();
        assert_eq!(first_n_mean(&data, 3), (5.0 + 1.0 + 4.0) / 3.0);
        assert_eq!(first_n_mean(&data, 100), 5.5);
        assert_eq!(first_n_mean(&data, 0), 0.0);
        assert_eq!(first_n_mean(&[], 5), 0.0);
    }

    #[test]
    fn test_first_n_percent_truncates_count() {
        let data = ten();
        // 25% of 10 samples is 2.5, truncated to 2
        assert_eq!(first_n_percent(&data, 25.0), 3.0);
        assert_eq!(first_n_percent(&data, 50.0), 3.0);
        assert_eq!(first_n_percent(&data, 150.0), 5.5);
        // 5% of 10 samples selects nothing
        assert_eq!(first_n_percent(&data, 5.0), 0.0);
        assert_eq!(first_n_percent(&data, -20.0), 0.0);
        assert_eq!(first_n_percent(&data, f64::NAN), 0.0);
    }

    #[test]
    fn test_top_and_bottom_percent() {
        let data = ten();
        assert_eq!(top_n_percent(&data, 30.0), 9.0);
        assert_eq!(bot_n_percent(&data, 30.0), 2.0);
        assert_eq!(top_n_percent(&data, 100.0), 5.5);
        assert_eq!(bot_n_percent(&data, 250.0), 5.5);
    }

    #[test]
    fn test_extreme_percent_selects_at_least_one() {
        let data = ten();
        assert_eq!(top_n_percent(&data, 0.5), 10.0);
        assert_eq!(bot_n_percent(&data, 0.5), 1.0);
    }

    #[test]
    fn test_extreme_percent_degenerate_inputs() {
        assert_eq!(top_n_percent(&[], 50.0), 0.0);
        assert_eq!(bot_n_percent(&[], 50.0), 0.0);
        assert_eq!(top_n_percent(&ten(), 0.0), 0.0);
        assert_eq!(bot_n_percent(&ten(), -5.0), 0.0);
    }

    #[test]
    fn test_percent_estimators_leave_input_untouched() {
        let data = ten();
        let original = data.clone();
        let _ = top_n_percent(&data, 40.0);
        let _ = bot_n_percent(&data, 40.0);
        assert_eq!(data, original);
    }
}
