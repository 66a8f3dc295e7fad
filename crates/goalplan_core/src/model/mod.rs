//! Domain model for goals, steps, accounts and the weekly slot grid.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation so repositories and services share one rule set.
//!
//! # Invariants
//! - Every goal and step is identified by a stable UUID.
//! - A step always belongs to exactly one goal.
//! - Grid cells marked `Reserved` are only changed by explicit user toggles.

pub mod goal;
pub mod grid;
pub mod step;
pub mod user;
