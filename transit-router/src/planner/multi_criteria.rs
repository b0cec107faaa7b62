//! Multi-criteria strategy: a Pareto set of arrivals per stop.
//!
//! Arrivals are compared on time, number of rides, generalized cost and
//! whether they came off a vehicle. While a pattern is scanned, every
//! trip that might still lead somewhere useful is ridden at once, kept in
//! a Pareto set of its own.

use std::cmp::Ordering;

use tracing::trace;

use crate::domain::{Cost, PatternIndex, StopIndex, Time, TransitMode, TripKey};
use crate::transit::{Timetable, TransitData};

use super::arrivals::{ArrivalId, Arrivals, LegKind, StopArrival, TransitLeg};
use super::boarding::{PreviousRide, TripBoarding, TripSearch, find_constrained};
use super::direction::TimeCalculator;
use super::pareto::{Dominance, ParetoComparator, ParetoSet};
use super::strategy::{RoundMarks, RoutingStrategy, SearchContext};

/// The criteria of an arrival held in a stop's Pareto set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct McStopArrival {
    pub id: ArrivalId,
    pub time: Time,
    pub rides: usize,
    pub cost: Cost,
    pub via_transit: bool,
    pub round: usize,
    pub iteration: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ArrivalComparator {
    calc: TimeCalculator,
}

impl ParetoComparator<McStopArrival> for ArrivalComparator {
    fn compare(&self, a: &McStopArrival, b: &McStopArrival) -> Dominance {
        Dominance::from_orderings([
            time_order(self.calc, a.time, b.time),
            a.rides.cmp(&b.rides),
            a.cost.cmp(&b.cost),
            // Arriving on board allows a transfer walk; arriving on foot doesn't
            b.via_transit.cmp(&a.via_transit),
        ])
    }
}

/// `Less` when `a` is the better time in search order.
fn time_order(calc: TimeCalculator, a: Time, b: Time) -> Ordering {
    if calc.is_better(a, b) {
        Ordering::Less
    } else if calc.is_better(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// A trip being ridden along the current pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRide {
    pub from: ArrivalId,
    pub boarding: TripBoarding,
    pub board_position: usize,
    pub board_stop: StopIndex,
    /// Time at which this run starts the pattern, in search order.
    pub trip_start: Time,
    /// Time at which this run finishes the pattern, in search order.
    pub trip_end: Time,
    pub rides: usize,
    /// Cost so far plus the riding cost to the end of the trip.
    pub relative_cost: Cost,
}

/// Compares rides on the pattern being scanned.
///
/// Trip start order only stands in for arrival order when trips never
/// overtake each other; otherwise rides on different runs are kept side by
/// side.
#[derive(Debug, Clone, Copy)]
pub struct RideComparator {
    calc: TimeCalculator,
    overtaking: bool,
}

impl ParetoComparator<PatternRide> for RideComparator {
    fn compare(&self, a: &PatternRide, b: &PatternRide) -> Dominance {
        let same_run = a.boarding.trip_index == b.boarding.trip_index && a.boarding.shift == b.boarding.shift;
        if self.overtaking && !same_run {
            return Dominance::Incomparable;
        }
        Dominance::from_orderings([
            time_order(self.calc, a.trip_start, b.trip_start),
            a.rides.cmp(&b.rides),
            a.relative_cost.cmp(&b.relative_cost),
        ])
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePattern {
    index: PatternIndex,
    mode: TransitMode,
    board_slack: i32,
    alight_slack: i32,
}

pub struct MultiCriteriaStrategy<'a, T: ?Sized> {
    ctx: SearchContext<'a, T>,
    arena: Arrivals,
    iteration: usize,
    round: usize,
    stops: Vec<ParetoSet<McStopArrival, ArrivalComparator>>,
    rides: ParetoSet<PatternRide, RideComparator>,
    marks: RoundMarks,
    destination: Vec<ArrivalId>,
    pattern: Option<ActivePattern>,
}

impl<'a, T: TransitData + ?Sized> MultiCriteriaStrategy<'a, T> {
    pub fn new(ctx: SearchContext<'a, T>) -> Self {
        let stop_count = ctx.data.stop_count();
        let comparator = ArrivalComparator { calc: ctx.calc };
        Self {
            ctx,
            arena: Arrivals::new(),
            iteration: 0,
            round: 0,
            stops: (0..stop_count).map(|_| ParetoSet::new(comparator)).collect(),
            rides: ParetoSet::new(RideComparator {
                calc: ctx.calc,
                overtaking: false,
            }),
            marks: RoundMarks::new(stop_count),
            destination: Vec::new(),
            pattern: None,
        }
    }

    fn timetable(&self, pattern: PatternIndex) -> &'a Timetable {
        let data: &'a T = self.ctx.data;
        data.timetable_for(pattern)
    }

    /// Arrivals at `stop` from the given round of this iteration.
    fn arrivals_from_round(&self, stop: StopIndex, round: usize, transit_only: bool) -> Vec<McStopArrival> {
        self.stops[stop.0]
            .iter()
            .filter(|a| a.round == round && a.iteration == self.iteration)
            .filter(|a| !transit_only || a.via_transit)
            .copied()
            .collect()
    }

    /// Adds an arrival to its stop's set, recording it if it qualifies.
    fn record(&mut self, arrival: StopArrival) -> bool {
        let via_transit = arrival.is_transit();
        let criteria = McStopArrival {
            id: self.arena.next_id(),
            time: arrival.time,
            rides: arrival.rides,
            cost: arrival.cost,
            via_transit,
            round: arrival.round,
            iteration: arrival.iteration,
        };
        let set = &mut self.stops[arrival.stop.0];
        if !set.qualifies(&criteria) {
            return false;
        }
        self.arena.push(arrival);
        set.add(criteria);
        self.marks.current.mark(arrival.stop);
        if via_transit {
            self.marks.transit.mark(arrival.stop);
        }
        true
    }

    fn add_ride(&mut self, position: usize, stop: StopIndex, from: &McStopArrival, boarding: TripBoarding) {
        let Some(active) = self.pattern else {
            return;
        };
        let timetable = self.timetable(active.index);
        let Some(trip) = timetable.trip(boarding.trip_index) else {
            return;
        };
        let calc = self.ctx.calc;
        let pattern_len = self.ctx.data.pattern(active.index).len();
        let first = calc.positions(pattern_len).next().unwrap_or(0);
        let last = calc.positions(pattern_len).last().unwrap_or(0);
        let trip_start = calc.board_time(trip, first, boarding.shift);
        let trip_end = calc.alight_time(trip, last, boarding.shift);

        let previous = self.arena.get(from.id);
        let reference = self.ctx.wait_reference(previous, boarding.time, active.board_slack);
        let boarding_cost = self.ctx.cost.boarding_cost(
            from.rides == 0,
            reference,
            stop,
            boarding.time,
            boarding.constraint.as_ref(),
        );
        let relative = self
            .ctx
            .cost
            .on_trip_relative_riding_cost(boarding.time, trip_end, active.mode);

        self.rides.add(PatternRide {
            from: from.id,
            boarding,
            board_position: position,
            board_stop: stop,
            trip_start,
            trip_end,
            rides: from.rides + 1,
            relative_cost: from.cost + boarding_cost + relative,
        });
    }

    fn board_regular(&mut self, position: usize, stop: StopIndex, from: &McStopArrival, excluded: &[usize]) {
        let Some(active) = self.pattern else {
            return;
        };
        let earliest = self.ctx.calc.plus(from.time, active.board_slack);
        let search = TripSearch::new(self.timetable(active.index), self.ctx.calc);
        if let Some(boarding) = search.find(position, earliest, None, excluded) {
            self.add_ride(position, stop, from, boarding);
        }
    }
}

impl<T: TransitData + ?Sized> RoutingStrategy for MultiCriteriaStrategy<'_, T> {
    fn prepare_for_iteration(&mut self, iteration: usize) {
        self.iteration = iteration;
        self.round = 0;
        self.marks.reset();
        self.pattern = None;
        self.rides.clear();
    }

    fn set_access_to_stop(&mut self, leg: usize, _departure: Time, arrival: Time) {
        let Some(access) = self.ctx.access.get(leg) else {
            return;
        };
        self.record(StopArrival {
            stop: access.stop,
            round: 0,
            iteration: self.iteration,
            time: arrival,
            rides: 0,
            cost: self.ctx.cost.access_egress_cost(access),
            previous: None,
            kind: LegKind::Access { leg },
        });
    }

    fn prepare_for_next_round(&mut self, round: usize) {
        self.round = round;
        self.marks.next_round();
        trace!(
            round,
            touched = self.marks.previous.as_slice().len(),
            arrivals = self.arena.len(),
            "Multi-criteria round"
        );
    }

    fn stops_touched_last_round(&self) -> &[StopIndex] {
        self.marks.previous.as_slice()
    }

    fn stops_touched_by_transit(&self) -> &[StopIndex] {
        self.marks.transit.as_slice()
    }

    fn is_touched_by_transit(&self, stop: StopIndex) -> bool {
        self.marks.transit.contains(stop)
    }

    fn prepare_for_transit_with(&mut self, pattern: PatternIndex) {
        let mode = self.ctx.data.pattern(pattern).mode();
        self.pattern = Some(ActivePattern {
            index: pattern,
            mode,
            board_slack: self.ctx.board_slack(mode),
            alight_slack: self.ctx.alight_slack(mode),
        });
        self.rides = ParetoSet::new(RideComparator {
            calc: self.ctx.calc,
            overtaking: self.timetable(pattern).has_overtaking(),
        });
    }

    fn alight(&mut self, position: usize, stop: StopIndex) {
        let Some(active) = self.pattern else {
            return;
        };
        let calc = self.ctx.calc;
        let timetable = self.timetable(active.index);
        let rides: Vec<PatternRide> = self.rides.iter().copied().collect();

        for ride in rides {
            let Some(trip) = timetable.trip(ride.boarding.trip_index) else {
                continue;
            };
            let alight_time = calc.alight_time(trip, position, ride.boarding.shift);
            let cost = self
                .ctx
                .cost
                .transit_arrival_cost(ride.relative_cost, alight_time, ride.trip_end, active.mode);

            self.record(StopArrival {
                stop,
                round: self.round,
                iteration: self.iteration,
                time: calc.plus(alight_time, active.alight_slack),
                rides: ride.rides,
                cost,
                previous: Some(ride.from),
                kind: LegKind::Transit(TransitLeg {
                    trip: TripKey::new(active.index, ride.boarding.trip_index),
                    shift: ride.boarding.shift,
                    board_stop: ride.board_stop,
                    board_position: ride.board_position,
                    alight_position: position,
                    board_time: ride.boarding.time,
                    alight_time,
                    constraint: ride.boarding.constraint,
                }),
            });
        }
    }

    fn board_with_regular_transfer(&mut self, position: usize, stop: StopIndex) {
        for from in self.arrivals_from_round(stop, self.round - 1, false) {
            self.board_regular(position, stop, &from, &[]);
        }
    }

    fn board_with_constrained_transfer(&mut self, position: usize, stop: StopIndex) {
        let Some(active) = self.pattern else {
            return;
        };

        for from in self.arrivals_from_round(stop, self.round - 1, false) {
            let previous = *self.arena.get(from.id);
            let Some(last) = self.arena.last_transit(from.id).copied() else {
                self.board_regular(position, stop, &from, &[]);
                continue;
            };
            let Some(leg) = last.transit_leg() else {
                continue;
            };
            let ride = PreviousRide {
                trip: leg.trip,
                stop: last.stop,
                alight_time: if previous.is_transit() { leg.alight_time } else { previous.time },
            };

            let earliest = self.ctx.calc.plus(from.time, active.board_slack);
            let found = find_constrained(
                self.ctx.data,
                self.ctx.calc,
                self.timetable(active.index),
                position,
                stop,
                ride,
                earliest,
            );

            // A usable rule replaces the regular search for this arrival
            match found.boarding {
                Some(boarding) => self.add_ride(position, stop, &from, boarding),
                None => self.board_regular(position, stop, &from, &found.excluded),
            }
        }
    }

    fn transfer_from_stop(&mut self, stop: StopIndex) {
        let calc = self.ctx.calc;
        let data = self.ctx.data;
        let transfers = if calc.is_forward() {
            data.transfers_from(stop)
        } else {
            data.transfers_to(stop)
        };

        for from in self.arrivals_from_round(stop, self.round, true) {
            for transfer in transfers {
                let target = if calc.is_forward() { transfer.to } else { transfer.from };
                self.record(StopArrival {
                    stop: target,
                    round: self.round,
                    iteration: self.iteration,
                    time: calc.plus(from.time, transfer.duration_secs),
                    rides: from.rides,
                    cost: from.cost + self.ctx.cost.transfer_cost(transfer.duration_secs),
                    previous: Some(from.id),
                    kind: LegKind::Transfer {
                        from_stop: stop,
                        duration_secs: transfer.duration_secs,
                    },
                });
            }
        }
    }

    fn arrive_at_destination(&mut self, leg: usize) {
        let Some(egress) = self.ctx.egress.get(leg) else {
            return;
        };
        let calc = self.ctx.calc;

        for from in self.arrivals_from_round(egress.stop, self.round, true) {
            let Some((start, end)) = calc.traverse_leg(egress, from.time) else {
                continue;
            };
            let wait = calc.duration(from.time, start);
            let id = self.arena.push(StopArrival {
                stop: egress.stop,
                round: self.round,
                iteration: self.iteration,
                time: end,
                rides: from.rides,
                cost: from.cost + self.ctx.cost.wait_cost(wait) + self.ctx.cost.access_egress_cost(egress),
                previous: Some(from.id),
                kind: LegKind::Egress { leg },
            });
            self.destination.push(id);
        }
    }

    fn take_destination_arrivals(&mut self) -> Vec<ArrivalId> {
        std::mem::take(&mut self.destination)
    }

    fn arrivals(&self) -> &Arrivals {
        &self.arena
    }
}
