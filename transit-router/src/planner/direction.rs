//! Time arithmetic that depends on the search direction.
//!
//! A depart-at search runs forward in time from the origin; an arrive-by
//! search runs backward from the destination. Everything direction-specific
//! goes through [`TimeCalculator`] so the strategies can be written once.

use serde::{Deserialize, Serialize};

use crate::domain::Time;
use crate::transit::{Pattern, TripSchedule};

use super::request::AccessEgress;

/// Which way the search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    /// Leave no earlier than the requested time.
    #[default]
    DepartAt,
    /// Arrive no later than the requested time.
    ArriveBy,
}

/// Direction-aware time comparisons and trip time lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCalculator {
    forward: bool,
}

impl TimeCalculator {
    pub fn new(direction: SearchDirection) -> Self {
        Self {
            forward: direction == SearchDirection::DepartAt,
        }
    }

    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// True if `a` is strictly better than `b`.
    pub fn is_better(&self, a: Time, b: Time) -> bool {
        if self.forward { a < b } else { a > b }
    }

    pub fn is_better_or_equal(&self, a: Time, b: Time) -> bool {
        a == b || self.is_better(a, b)
    }

    /// Moves `time` along the search by `secs`.
    pub fn plus(&self, time: Time, secs: i32) -> Time {
        if self.forward { time + secs } else { time - secs }
    }

    /// Moves `time` against the search by `secs`.
    pub fn minus(&self, time: Time, secs: i32) -> Time {
        if self.forward { time - secs } else { time + secs }
    }

    /// Seconds elapsed going from `from` to `to` in search order.
    pub fn duration(&self, from: Time, to: Time) -> i32 {
        if self.forward {
            to.duration_since(from)
        } else {
            from.duration_since(to)
        }
    }

    /// Placeholder for a stop that hasn't been reached.
    pub fn unreached(&self) -> Time {
        if self.forward { Time::MAX } else { Time::MIN }
    }

    /// Stop positions of a pattern with `len` stops, in search order.
    pub fn positions(&self, len: usize) -> impl Iterator<Item = usize> + use<> {
        let forward = self.forward;
        (0..len).map(move |i| if forward { i } else { len - 1 - i })
    }

    /// Time at which the search gets on a trip at `position`.
    pub fn board_time(&self, trip: &TripSchedule, position: usize, shift: i32) -> Time {
        if self.forward {
            trip.departure(position, shift)
        } else {
            trip.arrival(position, shift)
        }
    }

    /// Time at which the search gets off a trip at `position`.
    pub fn alight_time(&self, trip: &TripSchedule, position: usize, shift: i32) -> Time {
        if self.forward {
            trip.arrival(position, shift)
        } else {
            trip.departure(position, shift)
        }
    }

    /// The best run of `trip` the search can get on at `position`, no
    /// earlier than `earliest` in search order.
    pub fn board_instance(
        &self,
        trip: &TripSchedule,
        position: usize,
        earliest: Time,
    ) -> Option<(Time, i32)> {
        if self.forward {
            trip.earliest_departure_at(position, earliest)
        } else {
            trip.latest_arrival_at(position, earliest)
        }
    }

    /// Whether the search may get on a pattern at `position`.
    ///
    /// Searching backward, getting on means alighting in real time.
    pub fn can_board(&self, pattern: &Pattern, position: usize) -> bool {
        if self.forward {
            pattern.can_board(position)
        } else {
            pattern.can_alight(position)
        }
    }

    pub fn can_alight(&self, pattern: &Pattern, position: usize) -> bool {
        if self.forward {
            pattern.can_alight(position)
        } else {
            pattern.can_board(position)
        }
    }

    /// Iteration start times for a range search, worst first.
    ///
    /// Depart-at searches go from `start + window` back to `start`;
    /// arrive-by searches from `start - window` forward to `start`. The
    /// requested time is always the last iteration.
    pub fn iteration_times(&self, start: Time, window_secs: i32, step_secs: i32) -> Vec<Time> {
        let mut offsets: Vec<i32> = Vec::new();
        let mut offset = window_secs.max(0);
        while offset > 0 {
            offsets.push(offset);
            offset -= step_secs.max(1);
        }
        offsets.push(0);
        offsets.into_iter().map(|o| self.plus(start, o)).collect()
    }

    /// Walks an access or egress leg starting at `time` in search order.
    ///
    /// Returns the (start, end) times in search order, or `None` if opening
    /// hours rule the leg out.
    pub fn traverse_leg(&self, leg: &AccessEgress, time: Time) -> Option<(Time, Time)> {
        if self.forward {
            let departure = leg.earliest_departure_time(time)?;
            Some((departure, departure + leg.duration_secs))
        } else {
            let departure = leg.latest_departure_time(time - leg.duration_secs)?;
            Some((departure + leg.duration_secs, departure))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopIndex;
    use crate::planner::request::OpeningHours;

    fn t(s: i32) -> Time {
        Time::from_seconds(s)
    }

    const FORWARD: TimeCalculator = TimeCalculator { forward: true };
    const REVERSE: TimeCalculator = TimeCalculator { forward: false };

    #[test]
    fn comparisons_flip() {
        assert!(FORWARD.is_better(t(10), t(20)));
        assert!(!FORWARD.is_better(t(20), t(20)));
        assert!(FORWARD.is_better_or_equal(t(20), t(20)));
        assert!(REVERSE.is_better(t(20), t(10)));
        assert!(FORWARD.is_better(t(0), FORWARD.unreached()));
        assert!(REVERSE.is_better(t(0), REVERSE.unreached()));
    }

    #[test]
    fn arithmetic_flips() {
        assert_eq!(FORWARD.plus(t(100), 30), t(130));
        assert_eq!(REVERSE.plus(t(100), 30), t(70));
        assert_eq!(FORWARD.minus(t(100), 30), t(70));
        assert_eq!(FORWARD.duration(t(100), t(130)), 30);
        assert_eq!(REVERSE.duration(t(130), t(100)), 30);
    }

    #[test]
    fn positions_in_search_order() {
        assert_eq!(FORWARD.positions(3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(REVERSE.positions(3).collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn iteration_times_worst_first() {
        assert_eq!(
            FORWARD.iteration_times(t(1000), 120, 60),
            vec![t(1120), t(1060), t(1000)]
        );
        assert_eq!(
            REVERSE.iteration_times(t(1000), 100, 60),
            vec![t(900), t(960), t(1000)]
        );
        assert_eq!(FORWARD.iteration_times(t(1000), 0, 60), vec![t(1000)]);
    }

    #[test]
    fn traverse_leg_both_ways() {
        let leg = AccessEgress::new(StopIndex(0), 60);
        assert_eq!(FORWARD.traverse_leg(&leg, t(100)), Some((t(100), t(160))));
        assert_eq!(REVERSE.traverse_leg(&leg, t(100)), Some((t(100), t(40))));
    }

    #[test]
    fn traverse_leg_honours_opening_hours() {
        let leg = AccessEgress::new(StopIndex(0), 60).with_opening_hours(OpeningHours {
            open: t(500),
            close: t(800),
        });
        // Waits for opening
        assert_eq!(FORWARD.traverse_leg(&leg, t(100)), Some((t(500), t(560))));
        assert_eq!(FORWARD.traverse_leg(&leg, t(801)), None);
        // Backward: must have started by closing time
        assert_eq!(REVERSE.traverse_leg(&leg, t(1000)), Some((t(860), t(800))));
        assert_eq!(REVERSE.traverse_leg(&leg, t(550)), None);
    }

    #[test]
    fn trip_times_by_direction() {
        let trip = TripSchedule::scheduled("T", vec![t(100), t(200)], vec![t(110), t(210)]);
        assert_eq!(FORWARD.board_time(&trip, 0, 0), t(110));
        assert_eq!(FORWARD.alight_time(&trip, 1, 0), t(200));
        assert_eq!(REVERSE.board_time(&trip, 1, 0), t(200));
        assert_eq!(REVERSE.alight_time(&trip, 0, 0), t(110));
        assert_eq!(REVERSE.board_instance(&trip, 1, t(250)), Some((t(200), 0)));
        assert_eq!(FORWARD.board_instance(&trip, 0, t(111)), None);
    }
}
