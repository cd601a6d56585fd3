//! Types used for changepoint detection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a CUSUM alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmDirection {
    /// The upper statistic crossed the threshold: the mean moved up
    Upward,
    /// The lower statistic crossed the threshold: the mean moved down
    Downward,
}

impl AlarmDirection {
    /// Numeric code: 1 for upward, 0 for downward
    pub fn code(self) -> u8 {
        match self {
            AlarmDirection::Upward => 1,
            AlarmDirection::Downward => 0,
        }
    }
}

impl fmt::Display for AlarmDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmDirection::Upward => write!(f, "up"),
            AlarmDirection::Downward => write!(f, "down"),
        }
    }
}

/// A baseline move performed by the adaptive detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebaseline {
    /// Which statistic raised the alarm
    pub direction: AlarmDirection,
    /// Baseline mean before the alarm
    pub previous_mean: f64,
    /// Baseline mean after the alarm
    pub new_mean: f64,
}

/// Which deferred reset of the spike detector was consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetKind {
    /// The log-likelihood ratio had fallen below zero: forward variables are re-seeded
    Floor,
    /// A spike was detected: forward variables and both ratios are re-seeded
    Ceil,
}

impl fmt::Display for ResetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetKind::Floor => write!(f, "floor"),
            ResetKind::Ceil => write!(f, "ceil"),
        }
    }
}

/// Represents a detected changepoint
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePoint {
    /// Index in the time series where the change was signalled
    pub index: usize,
    /// Confidence score for this changepoint (0.0 to 1.0)
    pub confidence: f64,
    /// Optional description of the type of change detected
    pub change_type: Option<ChangeType>,
}

impl ChangePoint {
    /// Create a new changepoint
    pub fn new(index: usize, confidence: f64) -> Self {
        Self {
            index,
            confidence,
            change_type: None,
        }
    }

    /// Create a new changepoint with a specified change type
    pub fn with_type(index: usize, confidence: f64, change_type: ChangeType) -> Self {
        Self {
            index,
            confidence,
            change_type: Some(change_type),
        }
    }
}

impl fmt::Display for ChangePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change_type {
            Some(change_type) => write!(
                f,
                "ChangePoint {{ index: {}, confidence: {:.3}, type: {} }}",
                self.index, self.confidence, change_type
            ),
            None => write!(
                f,
                "ChangePoint {{ index: {}, confidence: {:.3} }}",
                self.index, self.confidence
            ),
        }
    }
}

/// Types of changes that can be detected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChangeType {
    /// Sustained change in mean level
    MeanShift(AlarmDirection),
    /// Short excursion into the high-variance regime
    Spike,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::MeanShift(direction) => write!(f, "Mean Shift ({direction})"),
            ChangeType::Spike => write!(f, "Spike"),
        }
    }
}

/// Result of replaying a recorded series through a detector
#[derive(Debug, Clone)]
pub struct ChangePointResult {
    /// List of detected changepoints
    changepoints: Vec<ChangePoint>,
    /// Algorithm used for detection
    algorithm: String,
    /// Total number of data points analyzed
    sample_size: usize,
    /// Detection statistics (algorithm-specific)
    statistics: Vec<f64>,
}

impl ChangePointResult {
    /// Create a new changepoint result
    pub fn new(
        changepoints: Vec<ChangePoint>,
        algorithm: String,
        sample_size: usize,
        statistics: Vec<f64>,
    ) -> Self {
        Self {
            changepoints,
            algorithm,
            sample_size,
            statistics,
        }
    }

    /// Get the detected changepoints
    pub fn changepoints(&self) -> &[ChangePoint] {
        &self.changepoints
    }

    /// Indices of the detected changepoints
    pub fn indices(&self) -> Vec<usize> {
        self.changepoints.iter().map(|cp| cp.index).collect()
    }

    /// Get the number of detected changepoints
    pub fn count(&self) -> usize {
        self.changepoints.len()
    }

    /// Get the algorithm name used for detection
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Get the sample size that was analyzed
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Get the detection statistics
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }
}

impl fmt::Display for ChangePointResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ChangePoint Detection Result:")?;
        writeln!(f, "  Algorithm: {}", self.algorithm)?;
        writeln!(f, "  Sample size: {}", self.sample_size)?;
        writeln!(f, "  Changepoints detected: {}", self.count())?;

        if !self.changepoints.is_empty() {
            writeln!(f, "  Detected changepoints:")?;
            for cp in &self.changepoints {
                writeln!(f, "    {}", cp)?;
            }
        }

        Ok(())
    }
}

/// Confidence of an alarm: how far the statistic overshoots, capped at 1
pub(crate) fn alarm_confidence(statistic: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 1.0;
    }
    (statistic / (threshold * 2.0)).min(1.0)
}
