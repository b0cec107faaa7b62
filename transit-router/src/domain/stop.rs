//! Index types for stops, patterns and trips.
//!
//! Every entity in a transit snapshot is addressed by a dense index so the
//! search can keep its per-stop state in plain vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of a stop, `0..stop_count`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopIndex(pub usize);

/// Dense index of a pattern within a snapshot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternIndex(pub usize);

/// Identifies one trip: its pattern plus its position in that pattern's timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripKey {
    pub pattern: PatternIndex,
    pub trip: usize,
}

impl TripKey {
    pub fn new(pattern: PatternIndex, trip: usize) -> Self {
        Self { pattern, trip }
    }
}

/// Vehicle mode of a pattern, used to pick per-mode slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    #[default]
    Bus,
    Tram,
    Subway,
    Rail,
    Ferry,
    Coach,
}

impl fmt::Debug for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stop({})", self.0)
    }
}

impl fmt::Display for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Debug for PatternIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({})", self.0)
    }
}

impl fmt::Display for PatternIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_debug() {
        assert_eq!(StopIndex(3).to_string(), "S3");
        assert_eq!(format!("{:?}", StopIndex(3)), "Stop(3)");
        assert_eq!(PatternIndex(7).to_string(), "P7");
        assert_eq!(format!("{:?}", PatternIndex(7)), "Pattern(7)");
    }

    #[test]
    fn serde_is_transparent() {
        assert_eq!(serde_json::to_string(&StopIndex(4)).unwrap(), "4");
        let p: PatternIndex = serde_json::from_str("2").unwrap();
        assert_eq!(p, PatternIndex(2));
    }

    #[test]
    fn mode_names() {
        let mode: TransitMode = serde_json::from_str("\"rail\"").unwrap();
        assert_eq!(mode, TransitMode::Rail);
        assert_eq!(TransitMode::default(), TransitMode::Bus);
    }
}
