//! Journeys as returned to the caller.
//!
//! A [`Path`] is built from a destination arrival by walking its chain of
//! arrivals back to the access leg. Searches that ran backward in time are
//! turned around here, so paths always read from origin to destination.

use serde::Serialize;

use crate::domain::{Cost, PatternIndex, StopIndex, Time};
use crate::transit::{TransferConstraint, TransitData};

use super::arrivals::{ArrivalId, Arrivals, LegKind, StopArrival};
use super::pareto::Dominance;
use super::strategy::SearchContext;

/// One leg of a journey, in real time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathLeg {
    /// From the origin to the first stop.
    Access {
        to_stop: StopIndex,
        departure_time: Time,
        arrival_time: Time,
    },
    Transit {
        trip_id: String,
        pattern: PatternIndex,
        from_stop: StopIndex,
        to_stop: StopIndex,
        departure_time: Time,
        arrival_time: Time,
        /// Rule applied when transferring onto this trip.
        #[serde(skip_serializing_if = "Option::is_none")]
        constraint: Option<TransferConstraint>,
    },
    Transfer {
        from_stop: StopIndex,
        to_stop: StopIndex,
        departure_time: Time,
        arrival_time: Time,
    },
    /// From the last stop to the destination.
    Egress {
        from_stop: StopIndex,
        departure_time: Time,
        arrival_time: Time,
    },
}

impl PathLeg {
    pub fn departure_time(&self) -> Time {
        match self {
            PathLeg::Access { departure_time, .. }
            | PathLeg::Transit { departure_time, .. }
            | PathLeg::Transfer { departure_time, .. }
            | PathLeg::Egress { departure_time, .. } => *departure_time,
        }
    }

    pub fn arrival_time(&self) -> Time {
        match self {
            PathLeg::Access { arrival_time, .. }
            | PathLeg::Transit { arrival_time, .. }
            | PathLeg::Transfer { arrival_time, .. }
            | PathLeg::Egress { arrival_time, .. } => *arrival_time,
        }
    }

    pub fn is_transit(&self) -> bool {
        matches!(self, PathLeg::Transit { .. })
    }
}

/// A complete journey from origin to destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Path {
    pub departure_time: Time,
    pub arrival_time: Time,
    pub transfers: usize,
    pub cost: Cost,
    pub legs: Vec<PathLeg>,
}

impl Path {
    /// Total journey time in seconds.
    pub fn duration_secs(&self) -> i32 {
        self.arrival_time.duration_since(self.departure_time)
    }

    pub fn transit_legs(&self) -> impl Iterator<Item = &PathLeg> {
        self.legs.iter().filter(|l| l.is_transit())
    }
}

/// Dominance over departure (later is better), arrival, transfers and cost.
pub fn compare_paths(a: &Path, b: &Path) -> Dominance {
    Dominance::from_orderings([
        b.departure_time.cmp(&a.departure_time),
        a.arrival_time.cmp(&b.arrival_time),
        a.transfers.cmp(&b.transfers),
        a.cost.cmp(&b.cost),
    ])
}

/// A leg in search order, before turning it into real time order.
struct SearchLeg<'s> {
    arrival: &'s StopArrival,
    start: Time,
    end: Time,
}

/// Builds the path ending at a destination arrival.
///
/// # Panics
///
/// Panics if the arrival chain doesn't start with an access leg.
pub fn build_path<T: TransitData + ?Sized>(
    ctx: &SearchContext<'_, T>,
    arena: &Arrivals,
    destination: ArrivalId,
) -> Path {
    let calc = ctx.calc;
    let chain = arena.chain(destination);

    let mut legs: Vec<SearchLeg> = Vec::with_capacity(chain.len());
    for (i, arrival) in chain.iter().enumerate() {
        let (start, end) = match arrival.kind {
            LegKind::Access { leg } => {
                let duration = ctx.access.get(leg).map_or(0, |l| l.duration_secs);
                let (mut start, mut end) = (calc.minus(arrival.time, duration), arrival.time);
                // Leave as late as the first boarding allows
                if let (Some(access), Some(next)) = (ctx.access.get(leg), chain.get(i + 1))
                    && let Some(transit) = next.transit_leg()
                {
                    let mode = ctx.data.pattern(transit.pattern()).mode();
                    let shifted_end = calc.minus(transit.board_time, ctx.board_slack(mode));
                    let shifted_start = calc.minus(shifted_end, duration);
                    if calc.is_better_or_equal(end, shifted_end)
                        && calc.traverse_leg(access, shifted_start) == Some((shifted_start, shifted_end))
                    {
                        (start, end) = (shifted_start, shifted_end);
                    }
                }
                (start, end)
            }
            LegKind::Transit(transit) => (transit.board_time, transit.alight_time),
            LegKind::Transfer { .. } => {
                let previous = legs.last().map_or(arrival.time, |l| l.arrival.time);
                (previous, arrival.time)
            }
            LegKind::Egress { leg } => {
                let duration = ctx.egress.get(leg).map_or(0, |l| l.duration_secs);
                (calc.minus(arrival.time, duration), arrival.time)
            }
        };
        legs.push(SearchLeg { arrival, start, end });
    }

    let legs = if calc.is_forward() {
        forward_legs(ctx, &legs)
    } else {
        reverse_legs(ctx, &legs)
    };

    let departure_time = legs.first().map_or(Time::MIN, PathLeg::departure_time);
    let arrival_time = legs.last().map_or(Time::MAX, PathLeg::arrival_time);
    let transfers = legs.iter().filter(|l| l.is_transit()).count().saturating_sub(1);
    let cost = arena.get(destination).cost;

    Path {
        departure_time,
        arrival_time,
        transfers,
        cost,
        legs,
    }
}

fn trip_id<T: TransitData + ?Sized>(ctx: &SearchContext<'_, T>, arrival: &StopArrival) -> String {
    arrival
        .transit_leg()
        .and_then(|leg| ctx.data.timetable_for(leg.pattern()).trip(leg.trip.trip))
        .map(|trip| trip.id().to_string())
        .unwrap_or_default()
}

fn forward_legs<T: TransitData + ?Sized>(ctx: &SearchContext<'_, T>, legs: &[SearchLeg]) -> Vec<PathLeg> {
    legs.iter()
        .map(|leg| {
            let arrival = leg.arrival;
            match arrival.kind {
                LegKind::Access { .. } => PathLeg::Access {
                    to_stop: arrival.stop,
                    departure_time: leg.start,
                    arrival_time: leg.end,
                },
                LegKind::Transit(transit) => PathLeg::Transit {
                    trip_id: trip_id(ctx, arrival),
                    pattern: transit.pattern(),
                    from_stop: transit.board_stop,
                    to_stop: arrival.stop,
                    departure_time: leg.start,
                    arrival_time: leg.end,
                    constraint: transit.constraint,
                },
                LegKind::Transfer { from_stop, .. } => PathLeg::Transfer {
                    from_stop,
                    to_stop: arrival.stop,
                    departure_time: leg.start,
                    arrival_time: leg.end,
                },
                LegKind::Egress { .. } => PathLeg::Egress {
                    from_stop: arrival.stop,
                    departure_time: leg.start,
                    arrival_time: leg.end,
                },
            }
        })
        .collect()
}

/// Turns a backward search around.
///
/// A rule found while boarding backward belongs to the transfer onto the
/// trip that follows in real time, so it moves one transit leg on.
fn reverse_legs<T: TransitData + ?Sized>(ctx: &SearchContext<'_, T>, legs: &[SearchLeg]) -> Vec<PathLeg> {
    let mut pending: Option<TransferConstraint> = None;
    legs.iter()
        .rev()
        .map(|leg| {
            let arrival = leg.arrival;
            match arrival.kind {
                LegKind::Access { .. } => PathLeg::Egress {
                    from_stop: arrival.stop,
                    departure_time: leg.end,
                    arrival_time: leg.start,
                },
                LegKind::Transit(transit) => {
                    let constraint = pending.take();
                    pending = transit.constraint;
                    PathLeg::Transit {
                        trip_id: trip_id(ctx, arrival),
                        pattern: transit.pattern(),
                        from_stop: arrival.stop,
                        to_stop: transit.board_stop,
                        departure_time: leg.end,
                        arrival_time: leg.start,
                        constraint,
                    }
                }
                LegKind::Transfer { from_stop, .. } => PathLeg::Transfer {
                    from_stop: arrival.stop,
                    to_stop: from_stop,
                    departure_time: leg.end,
                    arrival_time: leg.start,
                },
                LegKind::Egress { .. } => PathLeg::Access {
                    to_stop: arrival.stop,
                    departure_time: leg.end,
                    arrival_time: leg.start,
                },
            }
        })
        .collect()
}
