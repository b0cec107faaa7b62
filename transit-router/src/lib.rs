//! Round-based transit journey planner.
//!
//! Given a read-only transit network and the ways of reaching and leaving
//! it, answers: "which journeys are worth taking, departing around this
//! time?"

pub mod domain;
pub mod planner;
pub mod transit;
