//! Domain types for the transit router.
//!
//! This module contains the small value types shared by the snapshot and
//! the search. All types enforce their invariants at construction time, so
//! code that receives these types can trust their validity.

mod error;
mod stop;
mod time;

pub use error::DomainError;
pub use stop::{PatternIndex, StopIndex, TransitMode, TripKey};
pub use time::{Time, TimeError};

/// Generalized cost, in centi-seconds of equivalent travel time.
pub type Cost = i64;
