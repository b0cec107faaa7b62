//! Stop patterns.

use serde::{Deserialize, Serialize};

use crate::domain::{PatternIndex, StopIndex, TransitMode};

/// Whether passengers may board or alight at one position of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopRestriction {
    pub can_board: bool,
    pub can_alight: bool,
}

impl Default for StopRestriction {
    fn default() -> Self {
        Self {
            can_board: true,
            can_alight: true,
        }
    }
}

/// An ordered sequence of stops shared by one or more trips.
///
/// # Invariants
///
/// - At least two stops
/// - `restrictions` has one entry per stop position
#[derive(Debug, Clone)]
pub struct Pattern {
    index: PatternIndex,
    mode: TransitMode,
    stops: Vec<StopIndex>,
    restrictions: Vec<StopRestriction>,
}

impl Pattern {
    /// Creates a pattern where every position allows boarding and alighting.
    pub fn new(index: PatternIndex, mode: TransitMode, stops: Vec<StopIndex>) -> Self {
        let restrictions = vec![StopRestriction::default(); stops.len()];
        Self {
            index,
            mode,
            stops,
            restrictions,
        }
    }

    /// Replaces the boarding/alighting restrictions.
    ///
    /// Missing trailing entries default to unrestricted.
    pub fn with_restrictions(mut self, mut restrictions: Vec<StopRestriction>) -> Self {
        restrictions.resize(self.stops.len(), StopRestriction::default());
        self.restrictions = restrictions;
        self
    }

    pub fn index(&self) -> PatternIndex {
        self.index
    }

    pub fn mode(&self) -> TransitMode {
        self.mode
    }

    pub fn stops(&self) -> &[StopIndex] {
        &self.stops
    }

    /// Number of stop positions.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Stop at a position, if the position exists.
    pub fn stop_at(&self, position: usize) -> Option<StopIndex> {
        self.stops.get(position).copied()
    }

    /// First position at which this pattern visits `stop`.
    pub fn position_of(&self, stop: StopIndex) -> Option<usize> {
        self.stops.iter().position(|s| *s == stop)
    }

    pub fn can_board(&self, position: usize) -> bool {
        position + 1 < self.stops.len()
            && self.restrictions.get(position).is_some_and(|r| r.can_board)
    }

    pub fn can_alight(&self, position: usize) -> bool {
        position > 0 && self.restrictions.get(position).is_some_and(|r| r.can_alight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> Pattern {
        Pattern::new(
            PatternIndex(0),
            TransitMode::Bus,
            vec![StopIndex(4), StopIndex(2), StopIndex(7)],
        )
    }

    #[test]
    fn positions_and_stops() {
        let p = pattern();
        assert_eq!(p.len(), 3);
        assert_eq!(p.stop_at(1), Some(StopIndex(2)));
        assert_eq!(p.stop_at(3), None);
        assert_eq!(p.position_of(StopIndex(7)), Some(2));
        assert_eq!(p.position_of(StopIndex(0)), None);
    }

    #[test]
    fn no_boarding_at_last_stop_no_alighting_at_first() {
        let p = pattern();
        assert!(p.can_board(0));
        assert!(p.can_board(1));
        assert!(!p.can_board(2));
        assert!(!p.can_alight(0));
        assert!(p.can_alight(1));
        assert!(p.can_alight(2));
    }

    #[test]
    fn restrictions_apply() {
        let p = pattern().with_restrictions(vec![
            StopRestriction::default(),
            StopRestriction {
                can_board: false,
                can_alight: true,
            },
        ]);
        assert!(!p.can_board(1));
        assert!(p.can_alight(1));
        // Padded with defaults
        assert!(p.can_alight(2));
    }
}
