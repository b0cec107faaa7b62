//! Arena of stop arrivals.
//!
//! Every arrival a strategy records goes here and is never removed during a
//! search. Arrivals point back to the arrival they were reached from, so a
//! journey is recovered by walking the chain back to its access leg.

use crate::domain::{Cost, PatternIndex, StopIndex, Time, TripKey};
use crate::transit::TransferConstraint;

/// Index of an arrival in an [`Arrivals`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrivalId(usize);

/// One ride on a trip, in search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitLeg {
    pub trip: TripKey,
    pub shift: i32,
    pub board_stop: StopIndex,
    pub board_position: usize,
    pub alight_position: usize,
    pub board_time: Time,
    pub alight_time: Time,
    pub constraint: Option<TransferConstraint>,
}

impl TransitLeg {
    pub fn pattern(&self) -> PatternIndex {
        self.trip.pattern
    }
}

/// How an arrival was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    /// Index into the search's access legs.
    Access { leg: usize },
    Transit(TransitLeg),
    Transfer { from_stop: StopIndex, duration_secs: i32 },
    /// Index into the search's egress legs; the arrival's stop is where the
    /// leg starts.
    Egress { leg: usize },
}

/// A recorded arrival.
///
/// For transit arrivals `time` already includes the alight slack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopArrival {
    pub stop: StopIndex,
    pub round: usize,
    pub iteration: usize,
    pub time: Time,
    pub rides: usize,
    pub cost: Cost,
    pub previous: Option<ArrivalId>,
    pub kind: LegKind,
}

impl StopArrival {
    pub fn is_transit(&self) -> bool {
        matches!(self.kind, LegKind::Transit(_))
    }

    pub fn transit_leg(&self) -> Option<&TransitLeg> {
        match &self.kind {
            LegKind::Transit(leg) => Some(leg),
            _ => None,
        }
    }
}

/// Append-only store of arrivals for one search.
#[derive(Debug, Default)]
pub struct Arrivals {
    items: Vec<StopArrival>,
}

impl Arrivals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, arrival: StopArrival) -> ArrivalId {
        self.items.push(arrival);
        ArrivalId(self.items.len() - 1)
    }

    /// The id the next pushed arrival will get.
    pub fn next_id(&self) -> ArrivalId {
        ArrivalId(self.items.len())
    }

    pub fn get(&self, id: ArrivalId) -> &StopArrival {
        &self.items[id.0]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The chain ending at `id`, from its access leg forward in search order.
    ///
    /// # Panics
    ///
    /// Panics if the chain does not start with an access leg.
    pub fn chain(&self, id: ArrivalId) -> Vec<&StopArrival> {
        let mut chain = Vec::new();
        let mut next = Some(id);
        while let Some(current) = next {
            let arrival = self.get(current);
            chain.push(arrival);
            next = arrival.previous;
        }
        chain.reverse();

        assert!(
            matches!(chain.first().map(|a| a.kind), Some(LegKind::Access { .. })),
            "arrival chain does not start with an access leg"
        );
        chain
    }

    /// The most recent transit ride leading to `id`, skipping transfers.
    pub fn last_transit(&self, id: ArrivalId) -> Option<&StopArrival> {
        let mut next = Some(id);
        while let Some(current) = next {
            let arrival = self.get(current);
            match arrival.kind {
                LegKind::Transit(_) => return Some(arrival),
                LegKind::Transfer { .. } => next = arrival.previous,
                LegKind::Access { .. } | LegKind::Egress { .. } => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival(stop: usize, kind: LegKind, previous: Option<ArrivalId>) -> StopArrival {
        StopArrival {
            stop: StopIndex(stop),
            round: 0,
            iteration: 0,
            time: Time::from_seconds(0),
            rides: 0,
            cost: 0,
            previous,
            kind,
        }
    }

    fn transit() -> LegKind {
        LegKind::Transit(TransitLeg {
            trip: TripKey::new(PatternIndex(0), 0),
            shift: 0,
            board_stop: StopIndex(0),
            board_position: 0,
            alight_position: 1,
            board_time: Time::from_seconds(0),
            alight_time: Time::from_seconds(10),
            constraint: None,
        })
    }

    #[test]
    fn chain_runs_from_access() {
        let mut arena = Arrivals::new();
        let a = arena.push(arrival(0, LegKind::Access { leg: 0 }, None));
        let b = arena.push(arrival(1, transit(), Some(a)));
        let c = arena.push(arrival(
            2,
            LegKind::Transfer {
                from_stop: StopIndex(1),
                duration_secs: 30,
            },
            Some(b),
        ));

        let stops: Vec<_> = arena.chain(c).iter().map(|a| a.stop).collect();
        assert_eq!(stops, vec![StopIndex(0), StopIndex(1), StopIndex(2)]);
        assert_eq!(arena.last_transit(c).map(|a| a.stop), Some(StopIndex(1)));
        assert_eq!(arena.last_transit(a), None);
    }

    #[test]
    #[should_panic(expected = "access leg")]
    fn chain_without_access_panics() {
        let mut arena = Arrivals::new();
        let orphan = arena.push(arrival(1, transit(), None));
        arena.chain(orphan);
    }
}
