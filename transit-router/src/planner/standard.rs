//! Standard strategy: best arrival time per stop and round.
//!
//! Arrival times and transfer counts are optimised; cost is carried along
//! for the results but never drives a decision. Labels survive from one
//! range iteration to the next, so each iteration only records what it
//! improves.

use tracing::trace;

use crate::domain::{Cost, PatternIndex, StopIndex, Time, TransitMode, TripKey};
use crate::transit::{Timetable, TransitData};

use super::arrivals::{ArrivalId, Arrivals, LegKind, StopArrival, TransitLeg};
use super::boarding::{PreviousRide, TripBoarding, TripSearch, find_constrained};
use super::strategy::{RoundMarks, RoutingStrategy, SearchContext};

/// The trip currently ridden along a pattern.
#[derive(Debug, Clone, Copy)]
struct RideCursor {
    boarding: TripBoarding,
    from: ArrivalId,
    board_position: usize,
    board_stop: StopIndex,
    boarding_cost: Cost,
}

/// Pattern being scanned.
#[derive(Debug, Clone, Copy)]
struct ActivePattern {
    index: PatternIndex,
    mode: TransitMode,
    board_slack: i32,
    alight_slack: i32,
}

pub struct StandardStrategy<'a, T: ?Sized> {
    ctx: SearchContext<'a, T>,
    arena: Arrivals,
    iteration: usize,
    round: usize,
    /// Best arrival per round and stop, by any means.
    round_best: Vec<Vec<Option<ArrivalId>>>,
    /// Best transit arrival per round and stop.
    round_transit: Vec<Vec<Option<ArrivalId>>>,
    /// Best destination arrival time per round.
    destination_best: Vec<Time>,
    marks: RoundMarks,
    destination: Vec<ArrivalId>,
    pattern: Option<ActivePattern>,
    cursor: Option<RideCursor>,
}

impl<'a, T: TransitData + ?Sized> StandardStrategy<'a, T> {
    pub fn new(ctx: SearchContext<'a, T>) -> Self {
        let stops = ctx.data.stop_count();
        let rounds = ctx.max_rounds() + 1;
        Self {
            ctx,
            arena: Arrivals::new(),
            iteration: 0,
            round: 0,
            round_best: vec![vec![None; stops]; rounds],
            round_transit: vec![vec![None; stops]; rounds],
            destination_best: vec![ctx.calc.unreached(); rounds],
            marks: RoundMarks::new(stops),
            destination: Vec::new(),
            pattern: None,
            cursor: None,
        }
    }

    /// Best time at `stop` over rounds up to and including `round`.
    fn best_up_to(&self, table: &[Vec<Option<ArrivalId>>], round: usize, stop: StopIndex) -> Time {
        let calc = self.ctx.calc;
        table[..=round]
            .iter()
            .filter_map(|r| r[stop.0])
            .map(|id| self.arena.get(id).time)
            .fold(calc.unreached(), |best, t| if calc.is_better(t, best) { t } else { best })
    }

    fn timetable(&self, pattern: PatternIndex) -> &'a Timetable {
        let data: &'a T = self.ctx.data;
        data.timetable_for(pattern)
    }

    /// Switches to `boarding` if it gets on earlier than the current ride.
    fn try_board(&mut self, position: usize, stop: StopIndex, from: ArrivalId, boarding: TripBoarding) {
        let Some(active) = self.pattern else {
            return;
        };
        let calc = self.ctx.calc;
        let timetable = self.timetable(active.index);

        if let Some(cursor) = &self.cursor {
            let Some(current) = timetable.trip(cursor.boarding.trip_index) else {
                return;
            };
            let current_time = calc.board_time(current, position, cursor.boarding.shift);
            if !calc.is_better(boarding.time, current_time) {
                return;
            }
        }

        let previous = self.arena.get(from);
        let reference = self.ctx.wait_reference(previous, boarding.time, active.board_slack);
        let boarding_cost = self.ctx.cost.boarding_cost(
            previous.rides == 0,
            reference,
            stop,
            boarding.time,
            boarding.constraint.as_ref(),
        );

        self.cursor = Some(RideCursor {
            boarding,
            from,
            board_position: position,
            board_stop: stop,
            boarding_cost,
        });
    }

    /// Index bound for the regular search: the ridden scheduled trip.
    fn cursor_bound(&self, timetable: &Timetable) -> Option<usize> {
        self.cursor
            .map(|c| c.boarding.trip_index)
            .filter(|i| !timetable.frequency_trip_indices().contains(i))
    }

    fn board_regular_excluding(&mut self, position: usize, stop: StopIndex, from: ArrivalId, excluded: &[usize]) {
        let Some(active) = self.pattern else {
            return;
        };
        let timetable = self.timetable(active.index);
        let earliest = self.ctx.calc.plus(self.arena.get(from).time, active.board_slack);
        let search = TripSearch::new(timetable, self.ctx.calc);
        if let Some(boarding) = search.find(position, earliest, self.cursor_bound(timetable), excluded) {
            self.try_board(position, stop, from, boarding);
        }
    }

    /// Records a transit arrival if it improves the stop for this round.
    fn record_transit(&mut self, arrival: StopArrival) {
        let stop = arrival.stop;
        let round = self.round;
        let calc = self.ctx.calc;

        if !calc.is_better(arrival.time, self.best_up_to(&self.round_transit, round, stop)) {
            return;
        }
        let overall = calc.is_better(arrival.time, self.best_up_to(&self.round_best, round, stop));

        let id = self.arena.push(arrival);
        self.round_transit[round][stop.0] = Some(id);
        self.marks.transit.mark(stop);
        if overall {
            self.round_best[round][stop.0] = Some(id);
            self.marks.current.mark(stop);
        }
    }

    /// Records a non-transit arrival if it improves the stop for this round.
    fn record_other(&mut self, arrival: StopArrival) -> bool {
        let stop = arrival.stop;
        let round = arrival.round;
        if !self
            .ctx
            .calc
            .is_better(arrival.time, self.best_up_to(&self.round_best, round, stop))
        {
            return false;
        }
        let id = self.arena.push(arrival);
        self.round_best[round][stop.0] = Some(id);
        self.marks.current.mark(stop);
        true
    }
}

impl<T: TransitData + ?Sized> RoutingStrategy for StandardStrategy<'_, T> {
    fn prepare_for_iteration(&mut self, iteration: usize) {
        self.iteration = iteration;
        self.round = 0;
        self.marks.reset();
        self.pattern = None;
        self.cursor = None;
    }

    fn set_access_to_stop(&mut self, leg: usize, _departure: Time, arrival: Time) {
        let Some(access) = self.ctx.access.get(leg) else {
            return;
        };
        self.record_other(StopArrival {
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
            "Standard round"
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
        self.cursor = None;
    }

    fn alight(&mut self, position: usize, stop: StopIndex) {
        let (Some(active), Some(cursor)) = (self.pattern, self.cursor) else {
            return;
        };
        let calc = self.ctx.calc;
        let Some(trip) = self.timetable(active.index).trip(cursor.boarding.trip_index) else {
            return;
        };

        let previous = *self.arena.get(cursor.from);
        let alight_time = calc.alight_time(trip, position, cursor.boarding.shift);
        let riding = self
            .ctx
            .cost
            .riding_cost(cursor.boarding.time, alight_time, active.mode);

        self.record_transit(StopArrival {
            stop,
            round: self.round,
            iteration: self.iteration,
            time: calc.plus(alight_time, active.alight_slack),
            rides: previous.rides + 1,
            cost: previous.cost + cursor.boarding_cost + riding,
            previous: Some(cursor.from),
            kind: LegKind::Transit(TransitLeg {
                trip: TripKey::new(active.index, cursor.boarding.trip_index),
                shift: cursor.boarding.shift,
                board_stop: cursor.board_stop,
                board_position: cursor.board_position,
                alight_position: position,
                board_time: cursor.boarding.time,
                alight_time,
                constraint: cursor.boarding.constraint,
            }),
        });
    }

    fn board_with_regular_transfer(&mut self, position: usize, stop: StopIndex) {
        let Some(from) = self.round_best[self.round - 1][stop.0] else {
            return;
        };
        self.board_regular_excluding(position, stop, from, &[]);
    }

    fn board_with_constrained_transfer(&mut self, position: usize, stop: StopIndex) {
        let Some(from) = self.round_best[self.round - 1][stop.0] else {
            return;
        };
        let Some(active) = self.pattern else {
            return;
        };

        let previous = *self.arena.get(from);
        let Some(last) = self.arena.last_transit(from).copied() else {
            self.board_regular_excluding(position, stop, from, &[]);
            return;
        };
        let Some(leg) = last.transit_leg() else {
            return;
        };
        let ride = PreviousRide {
            trip: leg.trip,
            stop: last.stop,
            alight_time: if previous.is_transit() { leg.alight_time } else { previous.time },
        };

        let earliest = self.ctx.calc.plus(previous.time, active.board_slack);
        let found = find_constrained(
            self.ctx.data,
            self.ctx.calc,
            self.timetable(active.index),
            position,
            stop,
            ride,
            earliest,
        );

        if let Some(boarding) = found.boarding {
            let before = self.cursor.map(|c| c.boarding);
            self.try_board(position, stop, from, boarding);
            if self.cursor.map(|c| c.boarding) != before {
                return;
            }
        }
        self.board_regular_excluding(position, stop, from, &found.excluded);
    }

    fn transfer_from_stop(&mut self, stop: StopIndex) {
        let Some(from) = self.round_transit[self.round][stop.0] else {
            return;
        };
        let arrival = *self.arena.get(from);
        let calc = self.ctx.calc;
        let data = self.ctx.data;
        let transfers = if calc.is_forward() {
            data.transfers_from(stop)
        } else {
            data.transfers_to(stop)
        };

        for transfer in transfers {
            let target = if calc.is_forward() { transfer.to } else { transfer.from };
            self.record_other(StopArrival {
                stop: target,
                round: self.round,
                iteration: self.iteration,
                time: calc.plus(arrival.time, transfer.duration_secs),
                rides: arrival.rides,
                cost: arrival.cost + self.ctx.cost.transfer_cost(transfer.duration_secs),
                previous: Some(from),
                kind: LegKind::Transfer {
                    from_stop: stop,
                    duration_secs: transfer.duration_secs,
                },
            });
        }
    }

    fn arrive_at_destination(&mut self, leg: usize) {
        let Some(egress) = self.ctx.egress.get(leg) else {
            return;
        };
        let Some(from) = self.round_transit[self.round][egress.stop.0] else {
            return;
        };
        let arrival = *self.arena.get(from);
        let calc = self.ctx.calc;
        let Some((start, end)) = calc.traverse_leg(egress, arrival.time) else {
            return;
        };

        let best = self.destination_best[..=self.round]
            .iter()
            .fold(calc.unreached(), |b, t| if calc.is_better(*t, b) { *t } else { b });
        if !calc.is_better(end, best) {
            return;
        }
        self.destination_best[self.round] = end;

        let wait = calc.duration(arrival.time, start);
        let id = self.arena.push(StopArrival {
            stop: egress.stop,
            round: self.round,
            iteration: self.iteration,
            time: end,
            rides: arrival.rides,
            cost: arrival.cost + self.ctx.cost.wait_cost(wait) + self.ctx.cost.access_egress_cost(egress),
            previous: Some(from),
            kind: LegKind::Egress { leg },
        });
        self.destination.push(id);
    }

    fn take_destination_arrivals(&mut self) -> Vec<ArrivalId> {
        std::mem::take(&mut self.destination)
    }

    fn arrivals(&self) -> &Arrivals {
        &self.arena
    }
}
