//! Trip schedules, including frequency-based trips.

use crate::domain::Time;

/// Repeating service definition for a frequency-based trip.
///
/// The trip's stored stop times describe its first run. Run `k` uses the
/// same times shifted by `k * headway_secs`, for every run that starts no
/// later than `last_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub headway_secs: i32,
    pub last_start: Time,
}

/// Stop times of one trip along its pattern.
#[derive(Debug, Clone)]
pub struct TripSchedule {
    id: String,
    arrivals: Vec<Time>,
    departures: Vec<Time>,
    frequency: Option<Frequency>,
}

impl TripSchedule {
    /// Creates a trip with explicit stop times.
    ///
    /// Validation happens when the trip is added to a snapshot.
    pub fn scheduled(id: impl Into<String>, arrivals: Vec<Time>, departures: Vec<Time>) -> Self {
        Self {
            id: id.into(),
            arrivals,
            departures,
            frequency: None,
        }
    }

    /// Creates a frequency-based trip from the times of its first run.
    pub fn frequency(
        id: impl Into<String>,
        arrivals: Vec<Time>,
        departures: Vec<Time>,
        frequency: Frequency,
    ) -> Self {
        Self {
            id: id.into(),
            arrivals,
            departures,
            frequency: Some(frequency),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn frequency_info(&self) -> Option<Frequency> {
        self.frequency
    }

    pub fn is_frequency_based(&self) -> bool {
        self.frequency.is_some()
    }

    pub fn stop_count(&self) -> usize {
        self.arrivals.len()
    }

    /// Arrival at a position for the run shifted by `shift` seconds.
    pub fn arrival(&self, position: usize, shift: i32) -> Time {
        self.arrivals[position] + shift
    }

    /// Departure at a position for the run shifted by `shift` seconds.
    pub fn departure(&self, position: usize, shift: i32) -> Time {
        self.departures[position] + shift
    }

    /// Departure of the first run from the first stop.
    pub fn first_departure(&self) -> Time {
        self.departures[0]
    }

    pub(crate) fn arrivals(&self) -> &[Time] {
        &self.arrivals
    }

    pub(crate) fn departures(&self) -> &[Time] {
        &self.departures
    }

    /// Largest run number `k` still in service, 0 for scheduled trips.
    pub fn last_run(&self) -> i32 {
        match self.frequency {
            Some(f) => f.last_start.duration_since(self.first_departure()) / f.headway_secs,
            None => 0,
        }
    }

    /// The earliest run boarding at `position` at or after `earliest`.
    ///
    /// Returns the departure time and the run's shift. A frequency trip
    /// boarded at `T >= T0` yields `T0 + H*k` for the smallest `k` with
    /// `T0 + H*k >= T`.
    pub fn earliest_departure_at(&self, position: usize, earliest: Time) -> Option<(Time, i32)> {
        let base = self.departures[position];
        match self.frequency {
            None => (base >= earliest).then_some((base, 0)),
            Some(f) => {
                let behind = earliest.duration_since(base);
                let run = if behind <= 0 {
                    0
                } else {
                    (behind + f.headway_secs - 1) / f.headway_secs
                };
                if run > self.last_run() {
                    return None;
                }
                let shift = run * f.headway_secs;
                Some((base + shift, shift))
            }
        }
    }

    /// The latest run arriving at `position` at or before `latest`.
    pub fn latest_arrival_at(&self, position: usize, latest: Time) -> Option<(Time, i32)> {
        let base = self.arrivals[position];
        match self.frequency {
            None => (base <= latest).then_some((base, 0)),
            Some(f) => {
                let ahead = latest.duration_since(base);
                if ahead < 0 {
                    return None;
                }
                let run = (ahead / f.headway_secs).min(self.last_run());
                let shift = run * f.headway_secs;
                Some((base + shift, shift))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: i32) -> Time {
        Time::from_seconds(s)
    }

    fn frequent() -> TripSchedule {
        // First run leaves at 1000, then every 600s until 4000
        TripSchedule::frequency(
            "F1",
            vec![t(1000), t(1300)],
            vec![t(1000), t(1300)],
            Frequency {
                headway_secs: 600,
                last_start: t(4000),
            },
        )
    }

    #[test]
    fn scheduled_board_and_alight() {
        let trip = TripSchedule::scheduled("T1", vec![t(100), t(150)], vec![t(100), t(155)]);
        assert_eq!(trip.earliest_departure_at(0, t(90)), Some((t(100), 0)));
        assert_eq!(trip.earliest_departure_at(0, t(100)), Some((t(100), 0)));
        assert_eq!(trip.earliest_departure_at(0, t(101)), None);
        assert_eq!(trip.latest_arrival_at(1, t(150)), Some((t(150), 0)));
        assert_eq!(trip.latest_arrival_at(1, t(149)), None);
        assert_eq!(trip.last_run(), 0);
    }

    #[test]
    fn frequency_headway_rounds_up() {
        let trip = frequent();
        assert_eq!(trip.last_run(), 5);

        // Before the first run
        assert_eq!(trip.earliest_departure_at(0, t(500)), Some((t(1000), 0)));
        // Exactly on a run
        assert_eq!(trip.earliest_departure_at(0, t(1600)), Some((t(1600), 600)));
        // Between runs: next run
        assert_eq!(trip.earliest_departure_at(0, t(1601)), Some((t(2200), 1200)));
        // At a later position the same shift applies
        assert_eq!(trip.earliest_departure_at(1, t(1301)), Some((t(1900), 600)));
        // After the last run
        assert_eq!(trip.earliest_departure_at(0, t(4001)), None);
    }

    #[test]
    fn frequency_latest_arrival() {
        let trip = frequent();
        assert_eq!(trip.latest_arrival_at(1, t(1299)), None);
        assert_eq!(trip.latest_arrival_at(1, t(2000)), Some((t(1900), 600)));
        // Capped at the last run
        assert_eq!(trip.latest_arrival_at(1, t(99_999)), Some((t(4300), 3000)));
    }

    #[test]
    fn shifted_times() {
        let trip = frequent();
        assert_eq!(trip.departure(0, 600), t(1600));
        assert_eq!(trip.arrival(1, 1200), t(2500));
    }
}
