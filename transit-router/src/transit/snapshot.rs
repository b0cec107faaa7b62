//! The in-memory transit snapshot and its builder.
//!
//! A snapshot is assembled once, validated, indexed by stop and by trip, and
//! then only read. It is `Send + Sync` and can be shared by reference across
//! any number of concurrent searches.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{DomainError, PatternIndex, StopIndex, Time, TransitMode, TripKey};

use super::error::SnapshotError;
use super::pattern::{Pattern, StopRestriction};
use super::timetable::Timetable;
use super::transfer::{ConstrainedTransfer, Transfer, TransferConstraint};
use super::trip::{Frequency, TripSchedule};
use super::{PatternStop, TransitData};

/// Serialized form of a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotData {
    pub stop_count: usize,
    #[serde(default)]
    pub patterns: Vec<PatternData>,
    #[serde(default)]
    pub transfers: Vec<TransferData>,
    #[serde(default)]
    pub constrained_transfers: Vec<ConstrainedTransferData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternData {
    #[serde(default)]
    pub mode: TransitMode,
    pub stops: Vec<StopIndex>,
    #[serde(default)]
    pub restrictions: Vec<StopRestriction>,
    #[serde(default)]
    pub trips: Vec<TripData>,
}

/// One trip. When `departures` is omitted the arrival times are used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripData {
    pub id: String,
    pub arrivals: Vec<Time>,
    #[serde(default)]
    pub departures: Vec<Time>,
    #[serde(default)]
    pub frequency: Option<FrequencyData>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrequencyData {
    pub headway_secs: i32,
    pub last_start: Time,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransferData {
    pub from: StopIndex,
    pub to: StopIndex,
    pub duration_secs: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstrainedTransferData {
    pub from_trip: String,
    pub from_stop: StopIndex,
    pub to_trip: String,
    pub to_stop: StopIndex,
    #[serde(flatten)]
    pub constraint: TransferConstraint,
}

/// Read-only, indexed transit network.
#[derive(Debug)]
pub struct TransitSnapshot {
    stop_count: usize,
    patterns: Vec<Pattern>,
    timetables: Vec<Timetable>,
    patterns_by_stop: Vec<Vec<PatternStop>>,
    transfers_from: Vec<Vec<Transfer>>,
    transfers_to: Vec<Vec<Transfer>>,
    constrained_from: HashMap<(TripKey, StopIndex), Vec<ConstrainedTransfer>>,
    constrained_to: HashMap<(TripKey, StopIndex), Vec<ConstrainedTransfer>>,
    constraints_into_pattern: Vec<bool>,
    constraints_out_of_pattern: Vec<bool>,
}

impl TransitSnapshot {
    /// Builds a snapshot from its serialized form.
    pub fn from_data(data: SnapshotData) -> Result<Self, SnapshotError> {
        let mut builder = SnapshotBuilder::new(data.stop_count);

        for pattern in data.patterns {
            let trips = pattern
                .trips
                .into_iter()
                .map(|trip| {
                    let departures = if trip.departures.is_empty() {
                        trip.arrivals.clone()
                    } else {
                        trip.departures
                    };
                    match trip.frequency {
                        Some(f) => TripSchedule::frequency(
                            trip.id,
                            trip.arrivals,
                            departures,
                            Frequency {
                                headway_secs: f.headway_secs,
                                last_start: f.last_start,
                            },
                        ),
                        None => TripSchedule::scheduled(trip.id, trip.arrivals, departures),
                    }
                })
                .collect();
            builder.add_pattern_with_restrictions(
                pattern.mode,
                pattern.stops,
                pattern.restrictions,
                trips,
            )?;
        }

        for transfer in data.transfers {
            builder.add_transfer(transfer.from, transfer.to, transfer.duration_secs)?;
        }

        for c in data.constrained_transfers {
            builder.add_constrained_transfer(
                &c.from_trip,
                c.from_stop,
                &c.to_trip,
                c.to_stop,
                c.constraint,
            );
        }

        Ok(builder.build())
    }

    /// Reads and builds a snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let text = std::fs::read_to_string(path)?;
        let data: SnapshotData = serde_json::from_str(&text)?;
        Self::from_data(data)
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

impl TransitData for TransitSnapshot {
    fn stop_count(&self) -> usize {
        self.stop_count
    }

    fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    fn pattern(&self, index: PatternIndex) -> &Pattern {
        &self.patterns[index.0]
    }

    fn patterns_touching(&self, stop: StopIndex) -> &[PatternStop] {
        self.patterns_by_stop
            .get(stop.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn timetable_for(&self, pattern: PatternIndex) -> &Timetable {
        &self.timetables[pattern.0]
    }

    fn transfers_from(&self, stop: StopIndex) -> &[Transfer] {
        self.transfers_from
            .get(stop.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn transfers_to(&self, stop: StopIndex) -> &[Transfer] {
        self.transfers_to
            .get(stop.0)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn constrained_transfers_from(&self, trip: TripKey, stop: StopIndex) -> &[ConstrainedTransfer] {
        self.constrained_from
            .get(&(trip, stop))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn constrained_transfers_to(&self, trip: TripKey, stop: StopIndex) -> &[ConstrainedTransfer] {
        self.constrained_to
            .get(&(trip, stop))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn has_constrained_transfers_into(&self, pattern: PatternIndex) -> bool {
        self.constraints_into_pattern
            .get(pattern.0)
            .copied()
            .unwrap_or(false)
    }

    fn has_constrained_transfers_out_of(&self, pattern: PatternIndex) -> bool {
        self.constraints_out_of_pattern
            .get(pattern.0)
            .copied()
            .unwrap_or(false)
    }
}

/// Incrementally assembles and validates a [`TransitSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    stop_count: usize,
    patterns: Vec<Pattern>,
    timetables: Vec<Timetable>,
    transfers: Vec<Transfer>,
    constrained: Vec<ConstrainedTransfer>,
    trip_keys: HashMap<String, TripKey>,
}

impl SnapshotBuilder {
    pub fn new(stop_count: usize) -> Self {
        Self {
            stop_count,
            ..Self::default()
        }
    }

    /// Adds a pattern with its trips, returning its index.
    pub fn add_pattern(
        &mut self,
        mode: TransitMode,
        stops: Vec<StopIndex>,
        trips: Vec<TripSchedule>,
    ) -> Result<PatternIndex, DomainError> {
        self.add_pattern_with_restrictions(mode, stops, Vec::new(), trips)
    }

    /// Adds a pattern with boarding/alighting restrictions.
    pub fn add_pattern_with_restrictions(
        &mut self,
        mode: TransitMode,
        stops: Vec<StopIndex>,
        restrictions: Vec<StopRestriction>,
        trips: Vec<TripSchedule>,
    ) -> Result<PatternIndex, DomainError> {
        let index = PatternIndex(self.patterns.len());

        if stops.len() < 2 {
            return Err(DomainError::PatternTooShort(index));
        }
        for &stop in &stops {
            self.check_stop(stop)?;
        }
        for trip in &trips {
            validate_trip(index, stops.len(), trip)?;
        }

        let timetable = Timetable::new(index, trips);
        if timetable.has_overtaking() {
            debug!(pattern = %index, "Pattern has overtaking trips");
        }
        for (i, trip) in timetable.trips().iter().enumerate() {
            let key = TripKey::new(index, i);
            if self.trip_keys.insert(trip.id().to_string(), key).is_some() {
                warn!(trip = trip.id(), "Duplicate trip id, keeping the last one");
            }
        }

        self.patterns
            .push(Pattern::new(index, mode, stops).with_restrictions(restrictions));
        self.timetables.push(timetable);
        Ok(index)
    }

    /// Adds a directed transfer.
    pub fn add_transfer(
        &mut self,
        from: StopIndex,
        to: StopIndex,
        duration_secs: i32,
    ) -> Result<(), DomainError> {
        self.check_stop(from)?;
        self.check_stop(to)?;
        if duration_secs < 0 {
            return Err(DomainError::NegativeTransfer { from, to });
        }
        self.transfers.push(Transfer::new(from, to, duration_secs));
        Ok(())
    }

    /// Adds a constrained transfer between two trips, named by id.
    ///
    /// Rules naming unknown trips are dropped and `false` is returned. Rules
    /// naming a stop that isn't on the trip's pattern are kept, but never
    /// match during boarding.
    pub fn add_constrained_transfer(
        &mut self,
        from_trip: &str,
        from_stop: StopIndex,
        to_trip: &str,
        to_stop: StopIndex,
        constraint: TransferConstraint,
    ) -> bool {
        let (Some(&from_key), Some(&to_key)) =
            (self.trip_keys.get(from_trip), self.trip_keys.get(to_trip))
        else {
            warn!(from_trip, to_trip, "Constrained transfer names an unknown trip, dropping it");
            return false;
        };

        let from_position = self.patterns[from_key.pattern.0].position_of(from_stop);
        let to_position = self.patterns[to_key.pattern.0].position_of(to_stop);
        if from_position.is_none() || to_position.is_none() {
            warn!(
                from_trip,
                to_trip,
                from_stop = %from_stop,
                to_stop = %to_stop,
                "Constrained transfer names a stop not on its trip's pattern"
            );
        }

        self.constrained.push(ConstrainedTransfer {
            from_trip: from_key,
            from_stop,
            from_position,
            to_trip: to_key,
            to_stop,
            to_position,
            constraint,
        });
        true
    }

    /// Adds a constrained transfer with explicit trip keys and positions.
    ///
    /// No validation is done: the search must cope with whatever it's given.
    pub fn add_constrained_transfer_raw(&mut self, transfer: ConstrainedTransfer) {
        self.constrained.push(transfer);
    }

    /// Finds the key a trip id was registered under.
    pub fn trip_key(&self, id: &str) -> Option<TripKey> {
        self.trip_keys.get(id).copied()
    }

    /// Indexes everything and produces the snapshot.
    pub fn build(self) -> TransitSnapshot {
        let mut patterns_by_stop = vec![Vec::new(); self.stop_count];
        for pattern in &self.patterns {
            for (position, stop) in pattern.stops().iter().enumerate() {
                patterns_by_stop[stop.0].push(PatternStop {
                    pattern: pattern.index(),
                    position,
                });
            }
        }

        let mut transfers_from = vec![Vec::new(); self.stop_count];
        let mut transfers_to = vec![Vec::new(); self.stop_count];
        for transfer in self.transfers {
            transfers_from[transfer.from.0].push(transfer);
            transfers_to[transfer.to.0].push(transfer);
        }

        let mut constrained_from: HashMap<_, Vec<_>> = HashMap::new();
        let mut constrained_to: HashMap<_, Vec<_>> = HashMap::new();
        let mut constraints_into_pattern = vec![false; self.patterns.len()];
        let mut constraints_out_of_pattern = vec![false; self.patterns.len()];
        for c in self.constrained {
            if let Some(flag) = constraints_into_pattern.get_mut(c.to_trip.pattern.0) {
                *flag = true;
            }
            if let Some(flag) = constraints_out_of_pattern.get_mut(c.from_trip.pattern.0) {
                *flag = true;
            }
            constrained_from
                .entry((c.from_trip, c.from_stop))
                .or_default()
                .push(c);
            constrained_to.entry((c.to_trip, c.to_stop)).or_default().push(c);
        }

        debug!(
            stops = self.stop_count,
            patterns = self.patterns.len(),
            constrained = constrained_from.values().map(Vec::len).sum::<usize>(),
            "Transit snapshot built"
        );

        TransitSnapshot {
            stop_count: self.stop_count,
            patterns: self.patterns,
            timetables: self.timetables,
            patterns_by_stop,
            transfers_from,
            transfers_to,
            constrained_from,
            constrained_to,
            constraints_into_pattern,
            constraints_out_of_pattern,
        }
    }

    fn check_stop(&self, stop: StopIndex) -> Result<(), DomainError> {
        if stop.0 >= self.stop_count {
            return Err(DomainError::StopOutOfRange {
                stop,
                stop_count: self.stop_count,
            });
        }
        Ok(())
    }
}

fn validate_trip(
    pattern: PatternIndex,
    stop_count: usize,
    trip: &TripSchedule,
) -> Result<(), DomainError> {
    let arrivals = trip.arrivals();
    let departures = trip.departures();

    for found in [arrivals.len(), departures.len()] {
        if found != stop_count {
            return Err(DomainError::StopTimeCount {
                pattern,
                trip: trip.id().to_string(),
                expected: stop_count,
                found,
            });
        }
    }

    for position in 0..stop_count {
        let dwell_ok = arrivals[position] <= departures[position];
        let run_ok = position + 1 == stop_count || departures[position] <= arrivals[position + 1];
        if !dwell_ok || !run_ok {
            return Err(DomainError::DecreasingTimes {
                pattern,
                trip: trip.id().to_string(),
                position,
            });
        }
    }

    if let Some(f) = trip.frequency_info() {
        let invalid = |reason| DomainError::InvalidFrequency {
            pattern,
            trip: trip.id().to_string(),
            reason,
        };
        if f.headway_secs <= 0 {
            return Err(invalid("headway must be positive"));
        }
        if f.last_start < trip.first_departure() {
            return Err(invalid("last start is before the first departure"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit::TransferPriority;

    fn t(s: i32) -> Time {
        Time::from_seconds(s)
    }

    fn s(i: usize) -> StopIndex {
        StopIndex(i)
    }

    fn trip(id: &str, times: &[i32]) -> TripSchedule {
        let times: Vec<Time> = times.iter().map(|x| t(*x)).collect();
        TripSchedule::scheduled(id, times.clone(), times)
    }

    #[test]
    fn builds_indices() {
        let mut b = SnapshotBuilder::new(4);
        let p0 = b
            .add_pattern(TransitMode::Bus, vec![s(0), s(1), s(2)], vec![trip("A", &[0, 10, 20])])
            .unwrap();
        let p1 = b
            .add_pattern(TransitMode::Rail, vec![s(2), s(3)], vec![trip("B", &[30, 40])])
            .unwrap();
        b.add_transfer(s(1), s(3), 120).unwrap();
        assert!(b.add_constrained_transfer(
            "A",
            s(2),
            "B",
            s(2),
            TransferConstraint::new(TransferPriority::Preferred)
        ));
        let snap = b.build();

        assert_eq!(snap.stop_count(), 4);
        assert_eq!(snap.pattern_count(), 2);
        assert_eq!(snap.pattern(p1).mode(), TransitMode::Rail);
        assert_eq!(
            snap.patterns_touching(s(2)),
            &[
                PatternStop {
                    pattern: p0,
                    position: 2
                },
                PatternStop {
                    pattern: p1,
                    position: 0
                }
            ]
        );
        assert_eq!(snap.transfers_from(s(1)).len(), 1);
        assert_eq!(snap.transfers_to(s(3))[0].from, s(1));
        assert!(snap.transfers_from(s(3)).is_empty());

        let a = TripKey::new(p0, 0);
        let bk = TripKey::new(p1, 0);
        let found = snap.constrained_transfer(a, s(2), bk, s(2)).unwrap();
        assert_eq!(found.to_position, Some(0));
        assert_eq!(found.from_position, Some(2));
        assert_eq!(snap.constrained_transfers_to(bk, s(2)).len(), 1);
        assert!(snap.has_constrained_transfers_into(p1));
        assert!(!snap.has_constrained_transfers_into(p0));
        assert!(snap.has_constrained_transfers_out_of(p0));
    }

    #[test]
    fn rejects_bad_patterns() {
        let mut b = SnapshotBuilder::new(2);
        assert_eq!(
            b.add_pattern(TransitMode::Bus, vec![s(0)], vec![]),
            Err(DomainError::PatternTooShort(PatternIndex(0)))
        );
        assert!(matches!(
            b.add_pattern(TransitMode::Bus, vec![s(0), s(5)], vec![]),
            Err(DomainError::StopOutOfRange { .. })
        ));
        assert!(matches!(
            b.add_pattern(TransitMode::Bus, vec![s(0), s(1)], vec![trip("X", &[10])]),
            Err(DomainError::StopTimeCount { found: 1, .. })
        ));
        assert!(matches!(
            b.add_pattern(TransitMode::Bus, vec![s(0), s(1)], vec![trip("X", &[10, 5])]),
            Err(DomainError::DecreasingTimes { position: 0, .. })
        ));
    }

    #[test]
    fn rejects_bad_frequency() {
        let mut b = SnapshotBuilder::new(2);
        let freq = TripSchedule::frequency(
            "F",
            vec![t(0), t(10)],
            vec![t(0), t(10)],
            Frequency {
                headway_secs: 0,
                last_start: t(100),
            },
        );
        assert!(matches!(
            b.add_pattern(TransitMode::Bus, vec![s(0), s(1)], vec![freq]),
            Err(DomainError::InvalidFrequency { .. })
        ));
    }

    #[test]
    fn rejects_bad_transfers() {
        let mut b = SnapshotBuilder::new(2);
        assert!(b.add_transfer(s(0), s(9), 10).is_err());
        assert_eq!(
            b.add_transfer(s(0), s(1), -1),
            Err(DomainError::NegativeTransfer {
                from: s(0),
                to: s(1)
            })
        );
    }

    #[test]
    fn constrained_transfer_with_unknown_trip_is_dropped() {
        let mut b = SnapshotBuilder::new(3);
        b.add_pattern(TransitMode::Bus, vec![s(0), s(1)], vec![trip("A", &[0, 10])])
            .unwrap();
        assert!(!b.add_constrained_transfer(
            "A",
            s(1),
            "nope",
            s(1),
            TransferConstraint::default()
        ));
    }

    #[test]
    fn constrained_transfer_with_stop_off_pattern_is_kept_without_position() {
        let mut b = SnapshotBuilder::new(3);
        b.add_pattern(TransitMode::Bus, vec![s(0), s(1)], vec![trip("A", &[0, 10])])
            .unwrap();
        b.add_pattern(TransitMode::Bus, vec![s(1), s(2)], vec![trip("B", &[20, 30])])
            .unwrap();
        assert!(b.add_constrained_transfer(
            "A",
            s(1),
            "B",
            s(0),
            TransferConstraint::default()
        ));
        let snap = b.build();
        let rules = snap.constrained_transfers_from(TripKey::new(PatternIndex(0), 0), s(1));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].to_position, None);
    }

    #[test]
    fn from_data_fills_departures() {
        let json = r#"{
            "stop_count": 3,
            "patterns": [
                {
                    "stops": [0, 1, 2],
                    "trips": [
                        {"id": "T1", "arrivals": ["00:01:40", 150, 200]}
                    ]
                }
            ],
            "transfers": [{"from": 1, "to": 2, "duration_secs": 60}],
            "constrained_transfers": [
                {"from_trip": "T1", "from_stop": 1, "to_trip": "T1", "to_stop": 1,
                 "priority": "not_allowed"}
            ]
        }"#;
        let data: SnapshotData = serde_json::from_str(json).unwrap();
        let snap = TransitSnapshot::from_data(data).unwrap();

        let tt = snap.timetable_for(PatternIndex(0));
        assert_eq!(tt.trips()[0].departure(0, 0), t(100));
        assert_eq!(tt.trips()[0].arrival(2, 0), t(200));
        assert_eq!(snap.transfers_from(s(1)).len(), 1);
        let rules = snap.constrained_transfers_from(TripKey::new(PatternIndex(0), 0), s(1));
        assert!(rules[0].constraint.is_not_allowed());
    }

    #[test]
    fn from_json_file_reads_and_validates() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"stop_count": 2, "patterns": [{{"stops": [0, 1], "trips": [{{"id": "T", "arrivals": [0, 60]}}]}}]}}"#
        )
        .unwrap();
        let snap = TransitSnapshot::from_json_file(file.path()).unwrap();
        assert_eq!(snap.pattern_count(), 1);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, r#"{{"stop_count": 1, "patterns": [{{"stops": [0, 3]}}]}}"#).unwrap();
        assert!(matches!(
            TransitSnapshot::from_json_file(bad.path()),
            Err(SnapshotError::Invalid(DomainError::StopOutOfRange { .. }))
        ));

        assert!(matches!(
            TransitSnapshot::from_json_file("/definitely/not/here.json"),
            Err(SnapshotError::Io(_))
        ));
    }

    #[test]
    fn snapshot_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransitSnapshot>();
    }
}
