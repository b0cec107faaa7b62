//! Timetables: the trips running on one pattern.

use crate::domain::PatternIndex;

use super::trip::TripSchedule;

/// All trips of one pattern.
///
/// Scheduled trips come first, sorted by departure from the first stop,
/// followed by frequency-based trips sorted the same way. Trip indices into
/// this ordering are what [`TripKey`](crate::domain::TripKey) refers to.
#[derive(Debug, Clone)]
pub struct Timetable {
    pattern: PatternIndex,
    trips: Vec<TripSchedule>,
    scheduled_count: usize,
    overtaking: bool,
}

impl Timetable {
    /// Builds a timetable, ordering the trips.
    pub fn new(pattern: PatternIndex, trips: Vec<TripSchedule>) -> Self {
        let (mut scheduled, mut frequency): (Vec<_>, Vec<_>) =
            trips.into_iter().partition(|t| !t.is_frequency_based());

        scheduled.sort_by_key(|t| t.first_departure());
        frequency.sort_by_key(|t| t.first_departure());

        let overtaking = scheduled.windows(2).any(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            (0..a.stop_count())
                .any(|p| a.departure(p, 0) > b.departure(p, 0) || a.arrival(p, 0) > b.arrival(p, 0))
        });

        let scheduled_count = scheduled.len();
        scheduled.extend(frequency);

        Self {
            pattern,
            trips: scheduled,
            scheduled_count,
            overtaking,
        }
    }

    pub fn pattern(&self) -> PatternIndex {
        self.pattern
    }

    pub fn trips(&self) -> &[TripSchedule] {
        &self.trips
    }

    pub fn trip(&self, index: usize) -> Option<&TripSchedule> {
        self.trips.get(index)
    }

    /// Scheduled (non-frequency) trips, in departure order.
    pub fn scheduled_trips(&self) -> &[TripSchedule] {
        &self.trips[..self.scheduled_count]
    }

    /// Indices of frequency-based trips.
    pub fn frequency_trip_indices(&self) -> std::ops::Range<usize> {
        self.scheduled_count..self.trips.len()
    }

    /// Index of the trip with the given id.
    pub fn find_trip(&self, id: &str) -> Option<usize> {
        self.trips.iter().position(|t| t.id() == id)
    }

    /// True if some scheduled trip passes another along the pattern, in which
    /// case trips can't be binary-searched by time.
    pub fn has_overtaking(&self) -> bool {
        self.overtaking
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }
}
