//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for accounts, goals and steps.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Write paths validate model invariants before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod goal_repo;
pub mod user_repo;
