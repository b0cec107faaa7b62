//! The round-based search loop.
//!
//! Each range iteration starts the access legs at a slightly different
//! time, worst first, and runs up to `max_transfers + 1` rounds. A round
//! scans every pattern serving a stop improved in the previous round, then
//! walks transfers and egress legs from the stops reached by transit.

use std::collections::BTreeSet;
use std::time::Instant;

use tracing::{debug, info, trace};

use crate::domain::{PatternIndex, Time};
use crate::transit::TransitData;

use super::path::{Path, build_path, compare_paths};
use super::pareto::{Dominance, ParetoSet};
use super::strategy::{RoutingStrategy, SearchContext};

/// What a finished search produced.
#[derive(Debug)]
pub struct RouteOutcome {
    /// Pareto-optimal paths, unranked.
    pub paths: Vec<Path>,
    /// Number of range iterations that ran to completion.
    pub iterations: usize,
    pub timed_out: bool,
}

type PathComparator = fn(&Path, &Path) -> Dominance;

pub struct RoundWorker<'a, T: ?Sized, S> {
    ctx: SearchContext<'a, T>,
    strategy: S,
    deadline: Option<Instant>,
}

impl<'a, T: TransitData + ?Sized, S: RoutingStrategy> RoundWorker<'a, T, S> {
    pub fn new(ctx: SearchContext<'a, T>, strategy: S, deadline: Option<Instant>) -> Self {
        Self {
            ctx,
            strategy,
            deadline,
        }
    }

    fn out_of_time(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs every iteration of the range search from `start`.
    pub fn route(mut self, start: Time, window_secs: i32, step_secs: i32) -> RouteOutcome {
        let mut results: ParetoSet<Path, PathComparator> = ParetoSet::new(compare_paths);
        let times = self.ctx.calc.iteration_times(start, window_secs, step_secs);
        let mut iterations = 0;
        let mut timed_out = false;

        for (iteration, time) in times.into_iter().enumerate() {
            if self.out_of_time() {
                timed_out = true;
                break;
            }
            let completed = self.run_iteration(iteration, time);
            if completed {
                iterations += 1;
            }

            // Rounds finished before a timeout still count
            let found = self.strategy.take_destination_arrivals();
            let mut added = 0;
            for id in found {
                let path = build_path(&self.ctx, self.strategy.arrivals(), id);
                if results.add(path) {
                    added += 1;
                }
            }
            debug!(
                iteration,
                time = %time,
                added,
                paths = results.len(),
                arrivals = self.strategy.arrivals().len(),
                "Finished iteration"
            );
            if !completed {
                timed_out = true;
                break;
            }
        }

        if timed_out {
            info!(iterations, paths = results.len(), "Search timed out, returning partial results");
        }
        assert!(results.is_pareto_optimal(), "result set holds a dominated path");

        RouteOutcome {
            paths: results.into_vec(),
            iterations,
            timed_out,
        }
    }

    /// Runs one iteration; `false` if the deadline passed part way.
    fn run_iteration(&mut self, iteration: usize, time: Time) -> bool {
        let ctx = self.ctx;
        let calc = ctx.calc;
        self.strategy.prepare_for_iteration(iteration);

        for (leg, access) in ctx.access.iter().enumerate() {
            if let Some((departure, arrival)) = calc.traverse_leg(access, time) {
                self.strategy.set_access_to_stop(leg, departure, arrival);
            }
        }

        for round in 1..=ctx.max_rounds() {
            if self.out_of_time() {
                return false;
            }
            self.strategy.prepare_for_next_round(round);
            if self.strategy.stops_touched_last_round().is_empty() {
                trace!(iteration, round, "No stops improved, stopping early");
                break;
            }

            self.scan_patterns();

            let reached: Vec<_> = self.strategy.stops_touched_by_transit().to_vec();
            for stop in reached {
                self.strategy.transfer_from_stop(stop);
            }
            for (leg, egress) in ctx.egress.iter().enumerate() {
                if self.strategy.is_touched_by_transit(egress.stop) {
                    self.strategy.arrive_at_destination(leg);
                }
            }
        }
        true
    }

    fn scan_patterns(&mut self) {
        let data = self.ctx.data;
        let calc = self.ctx.calc;

        let patterns: BTreeSet<PatternIndex> = self
            .strategy
            .stops_touched_last_round()
            .iter()
            .flat_map(|&stop| data.patterns_touching(stop))
            .map(|ps| ps.pattern)
            .collect();

        for index in patterns {
            let pattern = data.pattern(index);
            let constrained = self.ctx.has_constrained_boarding(index);
            self.strategy.prepare_for_transit_with(index);

            for position in calc.positions(pattern.len()) {
                let Some(stop) = pattern.stop_at(position) else {
                    continue;
                };
                if calc.can_alight(pattern, position) {
                    self.strategy.alight(position, stop);
                }
                if calc.can_board(pattern, position) {
                    if constrained {
                        self.strategy.board_with_constrained_transfer(position, stop);
                    } else {
                        self.strategy.board_with_regular_transfer(position, stop);
                    }
                }
            }
        }
    }
}
