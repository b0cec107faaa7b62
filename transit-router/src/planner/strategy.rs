//! The contract between the round-based worker and a routing strategy.
//!
//! The worker owns the loop structure: iterations, rounds, patterns and
//! stop positions. A strategy owns the arrival state and decides what gets
//! recorded at each step.

use crate::domain::{PatternIndex, StopIndex, Time, TransitMode};
use crate::transit::TransitData;

use super::arrivals::{ArrivalId, Arrivals, LegKind, StopArrival};
use super::config::SearchConfig;
use super::cost::CostCalculator;
use super::direction::TimeCalculator;
use super::request::AccessEgress;

/// Everything a search reads but never changes.
pub struct SearchContext<'a, T: ?Sized> {
    pub data: &'a T,
    pub config: &'a SearchConfig,
    pub calc: TimeCalculator,
    pub cost: CostCalculator<'a>,
    /// Legs the search starts from, in search order.
    pub access: &'a [AccessEgress],
    /// Legs the search finishes with, in search order.
    pub egress: &'a [AccessEgress],
}

impl<T: ?Sized> Clone for SearchContext<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for SearchContext<'_, T> {}

impl<'a, T: TransitData + ?Sized> SearchContext<'a, T> {
    /// Slack before getting on a vehicle, in search order.
    pub fn board_slack(&self, mode: TransitMode) -> i32 {
        if self.calc.is_forward() {
            self.config.board_slack(mode)
        } else {
            self.config.alight_slack(mode)
        }
    }

    /// Slack after getting off a vehicle, in search order.
    pub fn alight_slack(&self, mode: TransitMode) -> i32 {
        if self.calc.is_forward() {
            self.config.alight_slack(mode)
        } else {
            self.config.board_slack(mode)
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.config.max_transfers + 1
    }

    /// Whether boardings onto `pattern` need the constrained-transfer check.
    pub fn has_constrained_boarding(&self, pattern: PatternIndex) -> bool {
        if self.calc.is_forward() {
            self.data.has_constrained_transfers_into(pattern)
        } else {
            self.data.has_constrained_transfers_out_of(pattern)
        }
    }

    /// Time to measure the wait before boarding from.
    ///
    /// Access legs can be started later so the traveller arrives just in
    /// time for the vehicle; when opening hours allow that, there is no
    /// wait.
    pub fn wait_reference(&self, previous: &StopArrival, board_time: Time, board_slack: i32) -> Time {
        let LegKind::Access { leg } = previous.kind else {
            return previous.time;
        };
        let Some(leg) = self.access.get(leg) else {
            return previous.time;
        };
        let shifted_end = self.calc.minus(board_time, board_slack);
        let shifted_start = self.calc.minus(shifted_end, leg.duration_secs);
        if self.calc.traverse_leg(leg, shifted_start) == Some((shifted_start, shifted_end)) {
            shifted_end
        } else {
            previous.time
        }
    }
}

/// Stops marked during one round.
#[derive(Debug, Clone, Default)]
pub struct TouchedStops {
    flags: Vec<bool>,
    stops: Vec<StopIndex>,
}

impl TouchedStops {
    pub fn new(stop_count: usize) -> Self {
        Self {
            flags: vec![false; stop_count],
            stops: Vec::new(),
        }
    }

    pub fn mark(&mut self, stop: StopIndex) {
        if !self.flags[stop.0] {
            self.flags[stop.0] = true;
            self.stops.push(stop);
        }
    }

    pub fn contains(&self, stop: StopIndex) -> bool {
        self.flags.get(stop.0).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[StopIndex] {
        &self.stops
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn clear(&mut self) {
        for stop in self.stops.drain(..) {
            self.flags[stop.0] = false;
        }
    }
}

/// Touched-stop bookkeeping shared by both strategies.
#[derive(Debug, Clone)]
pub struct RoundMarks {
    /// Stops improved in the current round.
    pub current: TouchedStops,
    /// Stops improved in the previous round.
    pub previous: TouchedStops,
    /// Stops reached by transit in the current round.
    pub transit: TouchedStops,
}

impl RoundMarks {
    pub fn new(stop_count: usize) -> Self {
        Self {
            current: TouchedStops::new(stop_count),
            previous: TouchedStops::new(stop_count),
            transit: TouchedStops::new(stop_count),
        }
    }

    pub fn next_round(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
        self.transit.clear();
    }

    pub fn reset(&mut self) {
        self.current.clear();
        self.previous.clear();
        self.transit.clear();
    }
}

/// Arrival state and decisions for one search.
///
/// The worker calls these in a fixed order: per iteration
/// `prepare_for_iteration` then `set_access_to_stop` for each usable access
/// leg; per round `prepare_for_next_round`, then for each pattern
/// `prepare_for_transit_with` followed by `alight` and one of the board
/// methods at each stop position, then `transfer_from_stop` and
/// `arrive_at_destination`.
pub trait RoutingStrategy {
    fn prepare_for_iteration(&mut self, iteration: usize);

    /// Records reaching `leg`'s stop, having started the leg at `departure`.
    fn set_access_to_stop(&mut self, leg: usize, departure: Time, arrival: Time);

    fn prepare_for_next_round(&mut self, round: usize);

    /// Stops improved in the round before the current one.
    fn stops_touched_last_round(&self) -> &[StopIndex];

    /// Stops reached by transit in the current round.
    fn stops_touched_by_transit(&self) -> &[StopIndex];

    fn is_touched_by_transit(&self, stop: StopIndex) -> bool;

    /// Starts scanning a pattern; drops any trips being ridden.
    fn prepare_for_transit_with(&mut self, pattern: PatternIndex);

    /// Gets off the ridden trip(s) at `position`.
    fn alight(&mut self, position: usize, stop: StopIndex);

    /// Gets on the best trip at `position` from last round's arrivals.
    fn board_with_regular_transfer(&mut self, position: usize, stop: StopIndex);

    /// Like [`RoutingStrategy::board_with_regular_transfer`], but honouring
    /// constrained transfers from the trip last ridden.
    fn board_with_constrained_transfer(&mut self, position: usize, stop: StopIndex);

    /// Walks from a stop reached by transit this round.
    fn transfer_from_stop(&mut self, stop: StopIndex);

    /// Takes egress leg `leg` from its stop, if reached by transit this round.
    fn arrive_at_destination(&mut self, leg: usize);

    /// Destination arrivals recorded since the last call.
    fn take_destination_arrivals(&mut self) -> Vec<ArrivalId>;

    fn arrivals(&self) -> &Arrivals;
}
