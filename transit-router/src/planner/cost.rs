//! Generalized cost.
//!
//! Costs are integers in centi-seconds of equivalent travel time. Every
//! contribution is non-negative, so a journey's cost never decreases as
//! legs are added.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Cost, StopIndex, Time, TransitMode};
use crate::transit::TransferConstraint;

use super::request::AccessEgress;

/// Tunable weights of the cost function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParams {
    /// Fixed penalty for every boarding (seconds).
    pub board_cost_secs: i32,

    /// Extra penalty for boardings after the first (seconds).
    pub transfer_cost_secs: i32,

    /// Extra transfer penalty at specific stops (seconds).
    pub stop_transfer_cost_secs: HashMap<StopIndex, i32>,

    /// Weight of time spent waiting for a vehicle.
    pub wait_reluctance: f64,

    /// Weight of time spent on board.
    pub transit_reluctance: f64,

    /// Per-mode overrides of `transit_reluctance`.
    pub transit_reluctance_by_mode: HashMap<TransitMode, f64>,

    /// Weight of time spent walking between stops, and on access/egress
    /// legs that carry no cost of their own.
    pub walk_reluctance: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            board_cost_secs: 60,
            transfer_cost_secs: 120,
            stop_transfer_cost_secs: HashMap::new(),
            wait_reluctance: 1.0,
            transit_reluctance: 1.0,
            transit_reluctance_by_mode: HashMap::new(),
            walk_reluctance: 2.0,
        }
    }
}

impl CostParams {
    /// Describes the first negative weight, if any.
    pub fn negative_weight(&self) -> Option<&'static str> {
        if self.board_cost_secs < 0 {
            return Some("board_cost_secs");
        }
        if self.transfer_cost_secs < 0 || self.stop_transfer_cost_secs.values().any(|c| *c < 0) {
            return Some("transfer cost");
        }
        if self.wait_reluctance < 0.0 {
            return Some("wait_reluctance");
        }
        if self.transit_reluctance < 0.0 || self.transit_reluctance_by_mode.values().any(|r| *r < 0.0)
        {
            return Some("transit reluctance");
        }
        if self.walk_reluctance < 0.0 {
            return Some("walk_reluctance");
        }
        None
    }
}

/// Weighted seconds as centi-seconds, never negative.
fn weighted(secs: i32, reluctance: f64) -> Cost {
    let secs = secs.max(0) as f64;
    (secs * 100.0 * reluctance.max(0.0)).round() as Cost
}

fn centi(secs: i32) -> Cost {
    Cost::from(secs.max(0)) * 100
}

/// Computes cost contributions for one search.
#[derive(Debug, Clone, Copy)]
pub struct CostCalculator<'a> {
    params: &'a CostParams,
}

impl<'a> CostCalculator<'a> {
    pub fn new(params: &'a CostParams) -> Self {
        Self { params }
    }

    /// Cost of getting on a trip.
    ///
    /// Covers the board penalty, the wait since `prev_arrival_time`, and for
    /// boardings after the first the transfer penalty plus the constraint's
    /// priority cost (an ordinary transfer when there is no constraint).
    pub fn boarding_cost(
        &self,
        first_boarding: bool,
        prev_arrival_time: Time,
        board_stop: StopIndex,
        board_time: Time,
        constraint: Option<&TransferConstraint>,
    ) -> Cost {
        let wait = board_time.duration_since(prev_arrival_time).abs();
        let mut cost = centi(self.params.board_cost_secs) + self.wait_cost(wait);

        if !first_boarding {
            let at_stop = self
                .params
                .stop_transfer_cost_secs
                .get(&board_stop)
                .copied()
                .unwrap_or(0);
            cost += centi(self.params.transfer_cost_secs) + centi(at_stop);
            cost += constraint.map_or(TransferConstraint::REGULAR_COST, TransferConstraint::cost);
        }
        cost
    }

    /// Riding cost from boarding to the end of the trip.
    ///
    /// Rides on one pattern can be compared on this even though they were
    /// boarded at different stops, since they all run to the same end.
    pub fn on_trip_relative_riding_cost(&self, board_time: Time, trip_end: Time, mode: TransitMode) -> Cost {
        weighted(trip_end.duration_since(board_time).abs(), self.transit_reluctance(mode))
    }

    /// Cost on arrival at an alight stop.
    ///
    /// `ride_cost` is the cost so far including the relative riding cost;
    /// the unridden remainder of the trip is taken back off.
    pub fn transit_arrival_cost(&self, ride_cost: Cost, alight_time: Time, trip_end: Time, mode: TransitMode) -> Cost {
        ride_cost - self.on_trip_relative_riding_cost(alight_time, trip_end, mode)
    }

    /// Cost of riding between two times.
    pub fn riding_cost(&self, board_time: Time, alight_time: Time, mode: TransitMode) -> Cost {
        weighted(alight_time.duration_since(board_time).abs(), self.transit_reluctance(mode))
    }

    /// Cost of walking a transfer.
    pub fn transfer_cost(&self, duration_secs: i32) -> Cost {
        weighted(duration_secs, self.params.walk_reluctance)
    }

    /// Cost of an access or egress leg.
    pub fn access_egress_cost(&self, leg: &AccessEgress) -> Cost {
        leg.cost
            .map(|c| c.max(0))
            .unwrap_or_else(|| weighted(leg.duration_secs, self.params.walk_reluctance))
    }

    pub fn wait_cost(&self, wait_secs: i32) -> Cost {
        weighted(wait_secs, self.params.wait_reluctance)
    }

    fn transit_reluctance(&self, mode: TransitMode) -> f64 {
        self.params
            .transit_reluctance_by_mode
            .get(&mode)
            .copied()
            .unwrap_or(self.params.transit_reluctance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::TransferPriority;

    fn t(s: i32) -> Time {
        Time::from_seconds(s)
    }

    #[test]
    fn first_boarding_has_no_transfer_cost() {
        let params = CostParams::default();
        let calc = CostCalculator::new(&params);

        let first = calc.boarding_cost(true, t(100), StopIndex(0), t(160), None);
        // 60s board + 60s wait at reluctance 1
        assert_eq!(first, 6_000 + 6_000);

        let later = calc.boarding_cost(false, t(100), StopIndex(0), t(160), None);
        assert_eq!(later, first + 12_000 + TransferConstraint::REGULAR_COST);
    }

    #[test]
    fn constraint_cost_replaces_regular() {
        let params = CostParams::default();
        let calc = CostCalculator::new(&params);
        let stay = TransferConstraint::default().stay_seated();
        let preferred = TransferConstraint::new(TransferPriority::Preferred);

        let regular = calc.boarding_cost(false, t(0), StopIndex(0), t(0), None);
        let seated = calc.boarding_cost(false, t(0), StopIndex(0), t(0), Some(&stay));
        let pref = calc.boarding_cost(false, t(0), StopIndex(0), t(0), Some(&preferred));
        assert!(seated < pref);
        assert!(pref < regular);
    }

    #[test]
    fn stop_transfer_cost_applies_after_first_boarding() {
        let mut params = CostParams::default();
        params.stop_transfer_cost_secs.insert(StopIndex(3), 30);
        let calc = CostCalculator::new(&params);

        let here = calc.boarding_cost(false, t(0), StopIndex(3), t(0), None);
        let elsewhere = calc.boarding_cost(false, t(0), StopIndex(4), t(0), None);
        assert_eq!(here - elsewhere, 3_000);
        assert_eq!(
            calc.boarding_cost(true, t(0), StopIndex(3), t(0), None),
            calc.boarding_cost(true, t(0), StopIndex(4), t(0), None)
        );
    }

    #[test]
    fn relative_riding_cost_recovers_ridden_part() {
        let params = CostParams::default();
        let calc = CostCalculator::new(&params);
        let end = t(1000);

        let relative = calc.on_trip_relative_riding_cost(t(200), end, TransitMode::Bus);
        let arrival = calc.transit_arrival_cost(relative, t(600), end, TransitMode::Bus);
        assert_eq!(arrival, calc.riding_cost(t(200), t(600), TransitMode::Bus));
        assert!(arrival >= 0);
    }

    #[test]
    fn mode_reluctance_override() {
        let mut params = CostParams::default();
        params.transit_reluctance_by_mode.insert(TransitMode::Rail, 0.5);
        let calc = CostCalculator::new(&params);
        assert_eq!(calc.riding_cost(t(0), t(100), TransitMode::Rail), 5_000);
        assert_eq!(calc.riding_cost(t(0), t(100), TransitMode::Bus), 10_000);
    }

    #[test]
    fn access_egress_cost_uses_leg_cost_or_walk() {
        let params = CostParams::default();
        let calc = CostCalculator::new(&params);
        let leg = AccessEgress::new(StopIndex(0), 50);
        assert_eq!(calc.access_egress_cost(&leg), 10_000);
        assert_eq!(calc.access_egress_cost(&leg.with_cost(123)), 123);
        assert_eq!(calc.transfer_cost(50), 10_000);
    }

    #[test]
    fn negative_weights_detected() {
        assert_eq!(CostParams::default().negative_weight(), None);
        let params = CostParams {
            wait_reluctance: -0.1,
            ..CostParams::default()
        };
        assert_eq!(params.negative_weight(), Some("wait_reluctance"));
    }
}
