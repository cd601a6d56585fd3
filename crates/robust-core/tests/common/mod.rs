//! Shared utilities for integration tests

#![allow(dead_code)]

pub use approx::assert_relative_eq;

pub const EPSILON: f64 = 1e-10;

/// Calibration recordings with known summary values
pub fn calibration_series() -> Vec<(&'static str, Vec<f64>)> {
    vec![
        ("flat", vec![3.0; 20]),
        ("ramp", (0..20).map(|i| i as f64).collect()),
        ("alternating", (0..20).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect()),
        ("single", vec![7.5]),
    ]
}

/// Special floating-point values for edge case testing
pub fn special_values() -> Vec<f64> {
    vec![
        0.0,
        -0.0,
        1.0,
        -1.0,
        f64::MIN_POSITIVE,
        f64::EPSILON,
        1e-320,
        f64::MAX,
        f64::MIN,
    ]
}
