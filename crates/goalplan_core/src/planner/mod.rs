//! Time planning over a user's steps.
//!
//! # Responsibility
//! - Split an hour budget across steps with a linear program (`allocator`).
//! - Place steps into open weekly slots greedily by priority (`scheduler`).
//!
//! # Invariants
//! - Both planners are pure: they read their inputs and return new values.
//! - Informational outcomes (nothing to do) are not errors.

pub mod allocator;
pub mod scheduler;
