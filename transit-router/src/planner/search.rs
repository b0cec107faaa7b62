//! The search entry point.
//!
//! [`Planner`] validates a request, picks the routing strategy named by the
//! configured profile, runs the round-based worker over the search window
//! and ranks what it finds.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::transit::TransitData;

use super::config::{Profile, SearchConfig};
use super::cost::CostCalculator;
use super::direction::TimeCalculator;
use super::multi_criteria::MultiCriteriaStrategy;
use super::path::Path;
use super::rank::rank_paths;
use super::request::RouteRequest;
use super::standard::StandardStrategy;
use super::strategy::SearchContext;
use super::worker::{RoundWorker, RouteOutcome};

/// Error from a search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

/// Result of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Found paths, ranked best-first.
    pub paths: Vec<Path>,

    /// Number of range iterations completed.
    pub iterations: usize,

    /// True if the search stopped early; `paths` holds what was found by then.
    pub timed_out: bool,
}

impl SearchResult {
    /// Create an empty result.
    pub fn empty() -> Self {
        Self {
            paths: Vec::new(),
            iterations: 0,
            timed_out: false,
        }
    }
}

/// Journey planner over a transit network.
///
/// A planner holds only shared references, so one network can serve many
/// planners on different threads at once.
pub struct Planner<'a, T: TransitData + ?Sized> {
    data: &'a T,
    config: &'a SearchConfig,
}

impl<'a, T: TransitData + ?Sized> Planner<'a, T> {
    /// Create a new planner.
    pub fn new(data: &'a T, config: &'a SearchConfig) -> Self {
        Self { data, config }
    }

    /// Search for paths matching `request`.
    pub fn route(&self, request: &RouteRequest) -> Result<SearchResult, SearchError> {
        request.validate(self.data.stop_count())?;
        if self.config.iteration_step_secs <= 0 {
            return Err(SearchError::InvalidRequest(
                "iteration step must be positive".to_string(),
            ));
        }

        let window_mins = request
            .search_window_mins
            .unwrap_or(self.config.search_window_mins)
            .max(0);
        let window_secs = i32::try_from(window_mins.saturating_mul(60))
            .map_err(|_| SearchError::InvalidRequest("search window is too long".to_string()))?;
        let deadline = self.config.timeout().map(|t| Instant::now() + t);

        debug!(
            profile = ?self.config.profile,
            direction = ?request.direction,
            time = %request.time,
            window_secs,
            access = request.access.len(),
            egress = request.egress.len(),
            "Starting search"
        );

        let ctx = SearchContext {
            data: self.data,
            config: self.config,
            calc: TimeCalculator::new(request.direction),
            cost: CostCalculator::new(&self.config.cost),
            access: request.search_access(),
            egress: request.search_egress(),
        };
        let step = self.config.iteration_step_secs;

        let outcome: RouteOutcome = match self.config.profile {
            Profile::Standard => RoundWorker::new(ctx, StandardStrategy::new(ctx), deadline)
                .route(request.time, window_secs, step),
            Profile::MultiCriteria => RoundWorker::new(ctx, MultiCriteriaStrategy::new(ctx), deadline)
                .route(request.time, window_secs, step),
        };

        let mut paths = rank_paths(outcome.paths, request.direction);
        paths.truncate(self.config.max_results);

        debug!(
            paths = paths.len(),
            iterations = outcome.iterations,
            timed_out = outcome.timed_out,
            "Search complete"
        );

        Ok(SearchResult {
            paths,
            iterations: outcome.iterations,
            timed_out: outcome.timed_out,
        })
    }
}
