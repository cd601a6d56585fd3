//! Event sinks for detector diagnostics
//!
//! Detectors report alarms, rebaselines, detections and resets through a
//! [`DetectionObserver`] instead of printing. The observer is a type parameter,
//! so the default [`NullObserver`] compiles away entirely.

use crate::types::{AlarmDirection, ResetKind};
use std::mem;

/// Something a detector did while processing a sample
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionEvent {
    /// A CUSUM statistic rose above the threshold
    Alarm {
        index: usize,
        direction: AlarmDirection,
        upper_sum: f64,
        lower_sum: f64,
    },

    /// The adaptive detector moved its baseline
    Rebaseline {
        index: usize,
        direction: AlarmDirection,
        previous_mean: f64,
        new_mean: f64,
    },

    /// The log-likelihood ratio exceeded the threshold
    SpikeDetected { index: usize, llr: f64 },

    /// A deferred reset re-seeded the forward variables
    ForwardReset {
        index: usize,
        kind: ResetKind,
        sample: f64,
    },
}

impl DetectionEvent {
    /// Index of the sample that produced the event
    pub fn index(&self) -> usize {
        match self {
            DetectionEvent::Alarm { index, .. }
            | DetectionEvent::Rebaseline { index, .. }
            | DetectionEvent::SpikeDetected { index, .. }
            | DetectionEvent::ForwardReset { index, .. } => *index,
        }
    }
}

/// Receives events emitted by a detector
pub trait DetectionObserver {
    /// Handle one event
    fn on_event(&mut self, event: &DetectionEvent);

    /// Detectors skip building events when this returns false
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Observer that performs no operations (zero-cost abstraction)
#[derive(Default, Clone, Copy, Debug)]
pub struct NullObserver;

impl DetectionObserver for NullObserver {
    #[inline(always)]
    fn on_event(&mut self, _: &DetectionEvent) {}

    #[inline(always)]
    fn is_enabled(&self) -> bool {
        false
    }
}

/// Forwards events to `tracing`
///
/// Alarms and detections are logged at `INFO`, baseline moves and resets at
/// `DEBUG`. The stream name is attached to every record.
#[derive(Clone, Debug)]
pub struct LoggingObserver {
    stream: String,
}

impl LoggingObserver {
    /// Create a logging observer for the named stream
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
        }
    }

    /// Name of the stream this observer reports for
    pub fn stream(&self) -> &str {
        &self.stream
    }
}

impl DetectionObserver for LoggingObserver {
    fn on_event(&mut self, event: &DetectionEvent) {
        match event {
            DetectionEvent::Alarm {
                index,
                direction,
                upper_sum,
                lower_sum,
            } => {
                tracing::info!(stream = %self.stream, index, %direction, upper_sum, lower_sum, "CUSUM alarm raised");
            }
            DetectionEvent::Rebaseline {
                index,
                direction,
                previous_mean,
                new_mean,
            } => {
                tracing::debug!(stream = %self.stream, index, %direction, previous_mean, new_mean, "baseline moved");
            }
            DetectionEvent::SpikeDetected { index, llr } => {
                tracing::info!(stream = %self.stream, index, llr, "log-likelihood ratio passed threshold");
            }
            DetectionEvent::ForwardReset {
                index,
                kind,
                sample,
            } => {
                tracing::debug!(stream = %self.stream, index, %kind, sample, "forward variables re-seeded");
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Default, Clone, Debug)]
pub struct RecordingObserver {
    events: Vec<DetectionEvent>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> &[DetectionEvent] {
        &self.events
    }

    /// Drain the recorded events
    pub fn take(&mut self) -> Vec<DetectionEvent> {
        mem::take(&mut self.events)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl DetectionObserver for RecordingObserver {
    fn on_event(&mut self, event: &DetectionEvent) {
        self.events.push(event.clone());
    }
}

impl<O: DetectionObserver + ?Sized> DetectionObserver for &mut O {
    fn on_event(&mut self, event: &DetectionEvent) {
        (**self).on_event(event);
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
