//! Domain model for goals and their aggregates.
//!
//! # Responsibility
//! - Define canonical data structures used by the board and projections.
//!
//! # Invariants
//! - Every goal is identified by a `GoalId`, confirmed or provisional.
//! - Aggregates are derived from the goal collection, never stored beside it.

pub mod goal;
pub mod stats;
