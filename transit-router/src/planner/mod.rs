//! Round-based journey planner.
//!
//! This module answers: "given these ways of reaching the network and these
//! ways of leaving it, which journeys are worth taking?"
//!
//! The search runs in rounds, where round `k` finds everything reachable
//! with `k` vehicle rides. A range search repeats the rounds for a series
//! of start times across a window, keeping every journey that no other
//! journey beats on departure, arrival, transfers and generalized cost.

mod arrivals;
mod boarding;
mod config;
mod cost;
mod direction;
mod multi_criteria;
mod pareto;
mod path;
mod rank;
mod request;
mod search;
mod standard;
mod strategy;
mod worker;


pub use arrivals::{ArrivalId, Arrivals, LegKind, StopArrival, TransitLeg};
pub use boarding::{ConstrainedBoarding, PreviousRide, TripBoarding, TripSearch, find_constrained};
pub use config::{ConfigError, Profile, SearchConfig};
pub use cost::{CostCalculator, CostParams};
pub use direction::{SearchDirection, TimeCalculator};
pub use multi_criteria::{McStopArrival, MultiCriteriaStrategy, PatternRide};
pub use pareto::{Dominance, ParetoComparator, ParetoSet};
pub use path::{Path, PathLeg, compare_paths};
pub use rank::rank_paths;
pub use request::{AccessEgress, OpeningHours, RouteRequest};
pub use search::{Planner, SearchError, SearchResult};
pub use standard::StandardStrategy;
pub use strategy::{RoutingStrategy, SearchContext};
pub use worker::{RoundWorker, RouteOutcome};
