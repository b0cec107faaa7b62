//! Finding the trip to board at a stop position.
//!
//! Regular boarding searches a pattern's timetable for the best run at or
//! after a time. Constrained boarding looks up transfer rules between the
//! trip just ridden and the trips of the pattern being scanned.

use crate::domain::{StopIndex, Time, TripKey};
use crate::transit::{ConstrainedTransfer, Timetable, TransferConstraint, TransitData};

use super::direction::TimeCalculator;

/// A trip run chosen for boarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripBoarding {
    /// Index into the pattern's timetable.
    pub trip_index: usize,
    /// Offset of the run from the trip's stored times (frequency trips).
    pub shift: i32,
    /// Board time in search order.
    pub time: Time,
    /// Rule that allowed this boarding, if it was a constrained transfer.
    pub constraint: Option<TransferConstraint>,
}

/// Regular trip search over one timetable.
#[derive(Debug, Clone, Copy)]
pub struct TripSearch<'a> {
    timetable: &'a Timetable,
    calc: TimeCalculator,
}

impl<'a> TripSearch<'a> {
    pub fn new(timetable: &'a Timetable, calc: TimeCalculator) -> Self {
        Self { timetable, calc }
    }

    /// The best run boardable at `position` no earlier than `earliest`.
    ///
    /// `bound` is the index of the scheduled trip currently ridden: only
    /// strictly better scheduled trips are considered. It is ignored when
    /// trips overtake, since index order then says nothing about time
    /// order. Trips in `excluded` are never returned.
    pub fn find(
        &self,
        position: usize,
        earliest: Time,
        bound: Option<usize>,
        excluded: &[usize],
    ) -> Option<TripBoarding> {
        let scheduled = if self.timetable.has_overtaking() {
            self.scan_scheduled(position, earliest, excluded)
        } else {
            self.search_scheduled(position, earliest, bound, excluded)
        };
        let frequency = self.search_frequency(position, earliest, excluded);

        match (scheduled, frequency) {
            (Some(s), Some(f)) => Some(if self.calc.is_better(f.time, s.time) { f } else { s }),
            (s, f) => s.or(f),
        }
    }

    /// Binary search over FIFO scheduled trips.
    fn search_scheduled(
        &self,
        position: usize,
        earliest: Time,
        bound: Option<usize>,
        excluded: &[usize],
    ) -> Option<TripBoarding> {
        let trips = self.timetable.scheduled_trips();
        let calc = self.calc;
        let boarding = |index: usize| {
            let time = calc.board_time(&trips[index], position, 0);
            TripBoarding {
                trip_index: index,
                shift: 0,
                time,
                constraint: None,
            }
        };

        if calc.is_forward() {
            // First trip departing at or after `earliest`, walking later past exclusions
            let first = trips.partition_point(|t| t.departure(position, 0) < earliest);
            let end = bound.map_or(trips.len(), |b| b.min(trips.len()));
            (first..end).find(|i| !excluded.contains(i)).map(boarding)
        } else {
            // Last trip arriving at or before `earliest`, walking earlier past exclusions
            let past_end = trips.partition_point(|t| t.arrival(position, 0) <= earliest);
            let start = bound.map_or(0, |b| b + 1);
            (start..past_end).rev().find(|i| !excluded.contains(i)).map(boarding)
        }
    }

    /// Linear scan, for timetables whose trips overtake.
    fn scan_scheduled(&self, position: usize, earliest: Time, excluded: &[usize]) -> Option<TripBoarding> {
        let calc = self.calc;
        self.timetable
            .scheduled_trips()
            .iter()
            .enumerate()
            .filter(|(i, _)| !excluded.contains(i))
            .map(|(i, trip)| TripBoarding {
                trip_index: i,
                shift: 0,
                time: calc.board_time(trip, position, 0),
                constraint: None,
            })
            .filter(|b| calc.is_better_or_equal(earliest, b.time))
            .reduce(|best, b| if calc.is_better(b.time, best.time) { b } else { best })
    }

    fn search_frequency(&self, position: usize, earliest: Time, excluded: &[usize]) -> Option<TripBoarding> {
        let calc = self.calc;
        self.timetable
            .frequency_trip_indices()
            .filter(|i| !excluded.contains(i))
            .filter_map(|i| {
                let trip = self.timetable.trip(i)?;
                let (time, shift) = calc.board_instance(trip, position, earliest)?;
                Some(TripBoarding {
                    trip_index: i,
                    shift,
                    time,
                    constraint: None,
                })
            })
            .reduce(|best, b| if calc.is_better(b.time, best.time) { b } else { best })
    }
}

/// The trip ridden into a stop, as seen by constrained boarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousRide {
    pub trip: TripKey,
    /// Stop where the search got off the trip.
    pub stop: StopIndex,
    /// Time the search got off, before any slack.
    pub alight_time: Time,
}

/// Outcome of looking up constrained transfers for one boarding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConstrainedBoarding {
    /// Best boarding allowed by a rule, if any.
    pub boarding: Option<TripBoarding>,
    /// Trips of the pattern the rules forbid transferring to.
    pub excluded: Vec<usize>,
}

/// Looks up constrained transfers from `previous` into the pattern of
/// `timetable` at `position`/`stop`.
///
/// `earliest` is the regular earliest board time; rules that ignore board
/// slack may board from `previous.alight_time` instead. Rules naming a
/// position that isn't this one, or no position at all, are ignored.
pub fn find_constrained<T: TransitData + ?Sized>(
    data: &T,
    calc: TimeCalculator,
    timetable: &Timetable,
    position: usize,
    stop: StopIndex,
    previous: PreviousRide,
    earliest: Time,
) -> ConstrainedBoarding {
    let pattern = timetable.pattern();
    let mut result = ConstrainedBoarding::default();

    // Searching backward, the trip we just left is the one transferred to.
    let rules: Vec<(TripKey, &ConstrainedTransfer)> = if calc.is_forward() {
        data.constrained_transfers_from(previous.trip, previous.stop)
            .iter()
            .filter(|c| c.to_trip.pattern == pattern && c.to_stop == stop && c.to_position == Some(position))
            .map(|c| (c.to_trip, c))
            .collect()
    } else {
        data.constrained_transfers_to(previous.trip, previous.stop)
            .iter()
            .filter(|c| c.from_trip.pattern == pattern && c.from_stop == stop && c.from_position == Some(position))
            .map(|c| (c.from_trip, c))
            .collect()
    };

    for (target, rule) in rules {
        let constraint = rule.constraint;
        if constraint.is_not_allowed() {
            result.excluded.push(target.trip);
            continue;
        }
        let Some(trip) = timetable.trip(target.trip) else {
            continue;
        };
        let from = if constraint.ignores_board_slack() {
            previous.alight_time
        } else {
            earliest
        };
        let Some((time, shift)) = calc.board_instance(trip, position, from) else {
            continue;
        };
        let candidate = TripBoarding {
            trip_index: target.trip,
            shift,
            time,
            constraint: Some(constraint),
        };
        let better = match result.boarding {
            None => true,
            Some(best) => {
                calc.is_better(time, best.time)
                    || (time == best.time && constraint.cost() < best.constraint.map_or(0, |c| c.cost()))
            }
        };
        if better {
            result.boarding = Some(candidate);
        }
    }

    result
}
