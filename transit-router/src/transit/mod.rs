//! The transit network the router searches over.
//!
//! The search only ever sees the network through [`TransitData`], which a
//! [`TransitSnapshot`] implements. Tests can build snapshots directly with
//! [`SnapshotBuilder`]; production loads them from JSON.

mod error;
mod pattern;
mod snapshot;
mod timetable;
mod transfer;
mod trip;

pub use error::SnapshotError;
pub use pattern::{Pattern, StopRestriction};
pub use snapshot::{
    ConstrainedTransferData, FrequencyData, PatternData, SnapshotBuilder, SnapshotData,
    TransferData, TransitSnapshot, TripData,
};
pub use timetable::Timetable;
pub use transfer::{ConstrainedTransfer, Transfer, TransferConstraint, TransferPriority};
pub use trip::{Frequency, TripSchedule};

use crate::domain::{PatternIndex, StopIndex, TripKey};

/// A pattern visiting a stop, and the position at which it does.
///
/// Patterns that loop appear once per visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStop {
    pub pattern: PatternIndex,
    pub position: usize,
}

/// Read-only access to a transit network.
///
/// Implementations must be safe to share between threads; searches never
/// mutate the network.
pub trait TransitData: Send + Sync {
    fn stop_count(&self) -> usize;

    fn pattern_count(&self) -> usize;

    fn pattern(&self, index: PatternIndex) -> &Pattern;

    /// Every (pattern, position) that visits `stop`.
    fn patterns_touching(&self, stop: StopIndex) -> &[PatternStop];

    fn timetable_for(&self, pattern: PatternIndex) -> &Timetable;

    /// Walks leaving `stop`.
    fn transfers_from(&self, stop: StopIndex) -> &[Transfer];

    /// Walks arriving at `stop`.
    fn transfers_to(&self, stop: StopIndex) -> &[Transfer];

    /// Constrained transfers out of `trip` when alighting at `stop`.
    fn constrained_transfers_from(&self, trip: TripKey, stop: StopIndex) -> &[ConstrainedTransfer];

    /// Constrained transfers into `trip` when boarding at `stop`.
    fn constrained_transfers_to(&self, trip: TripKey, stop: StopIndex) -> &[ConstrainedTransfer];

    /// True if any constrained transfer boards a trip of `pattern`.
    fn has_constrained_transfers_into(&self, pattern: PatternIndex) -> bool;

    /// True if any constrained transfer leaves a trip of `pattern`.
    fn has_constrained_transfers_out_of(&self, pattern: PatternIndex) -> bool;

    /// True if boarding `pattern` ever needs the constrained-transfer check.
    fn has_constrained_transfers(&self, pattern: PatternIndex) -> bool {
        self.has_constrained_transfers_into(pattern)
    }

    /// The constrained transfer between two specific trips at two stops, if any.
    fn constrained_transfer(
        &self,
        from_trip: TripKey,
        from_stop: StopIndex,
        to_trip: TripKey,
        to_stop: StopIndex,
    ) -> Option<&ConstrainedTransfer> {
        self.constrained_transfers_from(from_trip, from_stop)
            .iter()
            .find(|c| c.to_trip == to_trip && c.to_stop == to_stop)
    }
}
