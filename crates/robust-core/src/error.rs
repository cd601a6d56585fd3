//! Error types for sequential detection
//!
//! Provides a unified error type for all robust-sequential crates. Detector
//! updates never fail; errors only surface while validating configuration or
//! feeding batch helpers with unusable input.

use thiserror::Error;

/// Core error type for sequential detection
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a constructor or helper
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for empty input
    pub fn empty_input(operation: &str) -> Self {
        log::trace!("empty input passed to {operation}");
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for a parameter that must be strictly positive
    pub fn non_positive(name: &str, value: f64) -> Self {
        Self::InvalidParameter(format!("{name} must be positive, got {value}"))
    }

    /// Create an error for a parameter that must not be negative
    pub fn negative(name: &str, value: f64) -> Self {
        Self::InvalidParameter(format!("{name} must be non-negative, got {value}"))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::InvalidParameter(format!("{context} contains NaN or infinite values"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidParameter("delta must be non-zero".to_string());
        assert_eq!(err.to_string(), "Invalid parameter: delta must be non-zero");

        let err = Error::InvalidInput("window is empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: window is empty");

        let err = Error::InsufficientData { expected: 10, actual: 5 };
        assert_eq!(
            err.to_string(),
            "Insufficient data: expected at least 10 samples, got 5"
        );
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::empty_input("window mean");
        match err {
            Error::InsufficientData { expected, actual } => {
                assert_eq!(expected, 1);
                assert_eq!(actual, 0);
            }
            _ => panic!("Wrong error type"),
        }

        let err = Error::non_positive("sigma_low", -1.5);
        assert_eq!(
            err.to_string(),
            "Invalid parameter: sigma_low must be positive, got -1.5"
        );

        let err = Error::negative("threshold", -0.1);
        assert_eq!(
            err.to_string(),
            "Invalid parameter: threshold must be non-negative, got -0.1"
        );

        let err = Error::non_finite("mean");
        assert_eq!(
            err.to_string(),
            "Invalid parameter: mean contains NaN or infinite values"
        );
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_err = serde_json::from_str::<f64>("not a number").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("Config error:"));
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("custom error message");
        let err: Error = anyhow_err.into();

        match err {
            Error::Other(_) => {
                assert!(err.to_string().contains("custom error message"));
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_chaining() {
        fn inner() -> Result<()> {
            Err(Error::InvalidInput("inner error".to_string()))
        }

        fn outer() -> Result<()> {
            inner().map_err(|e| Error::InvalidInput(format!("outer error: {e}")))
        }

        let err = outer().unwrap_err();
        assert!(err.to_string().contains("outer error"));
        assert!(err.to_string().contains("inner error"));
    }
}
