//! Path ranking for search results.
//!
//! The search returns an unordered Pareto set; ranking puts the most useful
//! options first before results are truncated.

use std::cmp::Ordering;

use super::direction::SearchDirection;
use super::path::Path;

/// Rank paths by preference.
///
/// Depart-at searches rank paths by:
/// 1. Arrival time (earlier is better)
/// 2. Number of transfers (fewer is better)
/// 3. Generalized cost (lower is better)
/// 4. Departure time (later is better)
///
/// Arrive-by searches put departure time (later is better) first, then
/// transfers, cost and arrival time.
///
/// Returns paths sorted best-first.
pub fn rank_paths(mut paths: Vec<Path>, direction: SearchDirection) -> Vec<Path> {
    paths.sort_by(|a, b| compare_for(direction, a, b));
    paths
}

fn compare_for(direction: SearchDirection, a: &Path, b: &Path) -> Ordering {
    match direction {
        SearchDirection::DepartAt => a
            .arrival_time
            .cmp(&b.arrival_time)
            .then(a.transfers.cmp(&b.transfers))
            .then(a.cost.cmp(&b.cost))
            .then(b.departure_time.cmp(&a.departure_time)),
        SearchDirection::ArriveBy => b
            .departure_time
            .cmp(&a.departure_time)
            .then(a.transfers.cmp(&b.transfers))
            .then(a.cost.cmp(&b.cost))
            .then(a.arrival_time.cmp(&b.arrival_time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cost, Time};

    fn path(dep: i32, arr: i32, transfers: usize, cost: Cost) -> Path {
        Path {
            departure_time: Time::from_seconds(dep),
            arrival_time: Time::from_seconds(arr),
            transfers,
            cost,
            legs: Vec::new(),
        }
    }

    #[test]
    fn rank_by_arrival() {
        let ranked = rank_paths(
            vec![path(0, 400, 0, 0), path(0, 300, 0, 0)],
            SearchDirection::DepartAt,
        );

        assert_eq!(ranked[0].arrival_time, Time::from_seconds(300));
        assert_eq!(ranked[1].arrival_time, Time::from_seconds(400));
    }

    #[test]
    fn rank_by_transfers_when_same_arrival() {
        let ranked = rank_paths(
            vec![path(0, 300, 2, 0), path(0, 300, 0, 900)],
            SearchDirection::DepartAt,
        );

        // Same arrival, fewer transfers wins over lower cost
        assert_eq!(ranked[0].transfers, 0);
        assert_eq!(ranked[1].transfers, 2);
    }

    #[test]
    fn later_departure_breaks_ties() {
        let ranked = rank_paths(
            vec![path(10, 300, 0, 0), path(60, 300, 0, 0)],
            SearchDirection::DepartAt,
        );
        assert_eq!(ranked[0].departure_time, Time::from_seconds(60));
    }

    #[test]
    fn arrive_by_ranks_by_departure() {
        let ranked = rank_paths(
            vec![path(10, 200, 0, 0), path(50, 290, 1, 0)],
            SearchDirection::ArriveBy,
        );
        assert_eq!(ranked[0].departure_time, Time::from_seconds(50));
        assert_eq!(ranked[1].departure_time, Time::from_seconds(10));
    }

    #[test]
    fn empty_input() {
        assert!(rank_paths(vec![], SearchDirection::DepartAt).is_empty());
        assert!(rank_paths(vec![], SearchDirection::ArriveBy).is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::Time;
    use proptest::prelude::*;

    /// Strategy for a single path with parameterized times.
    fn path_strategy() -> impl Strategy<Value = Path> {
        (
            0i32..7200,  // departure (seconds)
            60i32..3600, // duration
            0usize..4,   // transfers
            0i64..50_000,
        )
            .prop_map(|(dep, duration, transfers, cost)| Path {
                departure_time: Time::from_seconds(dep),
                arrival_time: Time::from_seconds(dep + duration),
                transfers,
                cost,
                legs: Vec::new(),
            })
    }

    fn paths_strategy() -> impl Strategy<Value = Vec<Path>> {
        prop::collection::vec(path_strategy(), 0..15)
    }

    fn direction_strategy() -> impl Strategy<Value = SearchDirection> {
        prop_oneof![Just(SearchDirection::DepartAt), Just(SearchDirection::ArriveBy)]
    }

    proptest! {
        #[test]
        fn rank_paths_is_sorted(paths in paths_strategy()) {
            let ranked = rank_paths(paths, SearchDirection::DepartAt);

            for window in ranked.windows(2) {
                let a = &window[0];
                let b = &window[1];

                let a_key = (a.arrival_time, a.transfers, a.cost);
                let b_key = (b.arrival_time, b.transfers, b.cost);

                prop_assert!(
                    a_key <= b_key,
                    "Not sorted: {:?} should come before {:?}",
                    a_key,
                    b_key
                );
            }
        }

        #[test]
        fn arrive_by_is_sorted_by_departure(paths in paths_strategy()) {
            let ranked = rank_paths(paths, SearchDirection::ArriveBy);

            for window in ranked.windows(2) {
                prop_assert!(window[0].departure_time >= window[1].departure_time);
            }
        }

        #[test]
        fn rank_paths_preserves_elements(paths in paths_strategy(), direction in direction_strategy()) {
            let mut original = paths.clone();
            let mut ranked = rank_paths(paths, direction);

            prop_assert_eq!(ranked.len(), original.len());
            let key = |p: &Path| (p.departure_time, p.arrival_time, p.transfers, p.cost);
            original.sort_by_key(key);
            ranked.sort_by_key(key);
            prop_assert_eq!(ranked, original);
        }
    }
}
