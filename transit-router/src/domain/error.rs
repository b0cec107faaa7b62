//! Domain error types.
//!
//! These errors represent validation failures in snapshot data. They are
//! distinct from IO and parse errors, which are wrapped at the loading layer.

use super::{PatternIndex, StopIndex};

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A stop index is outside `0..stop_count`
    #[error("stop {stop} is out of range (stop count {stop_count})")]
    StopOutOfRange { stop: StopIndex, stop_count: usize },

    /// A pattern must visit at least two stops
    #[error("pattern {0} has fewer than two stops")]
    PatternTooShort(PatternIndex),

    /// Trip times don't line up with the pattern's stops
    #[error("trip {trip} on pattern {pattern} has {found} stop times, expected {expected}")]
    StopTimeCount {
        pattern: PatternIndex,
        trip: String,
        expected: usize,
        found: usize,
    },

    /// Trip times go backwards along the pattern
    #[error("trip {trip} on pattern {pattern} has decreasing times at position {position}")]
    DecreasingTimes {
        pattern: PatternIndex,
        trip: String,
        position: usize,
    },

    /// Frequency definition is unusable
    #[error("trip {trip} on pattern {pattern} has an invalid frequency: {reason}")]
    InvalidFrequency {
        pattern: PatternIndex,
        trip: String,
        reason: &'static str,
    },

    /// Transfer with a negative duration
    #[error("transfer from {from} to {to} has a negative duration")]
    NegativeTransfer { from: StopIndex, to: StopIndex },
}
