//! Core domain logic for goalplan.
//! This crate is the single source of truth for goal, step and planning rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod planner;
pub mod repo;
pub mod report;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::goal::{Goal, GoalId, GoalPlan, GoalValidationError};
pub use model::grid::{Cell, GridConfig, GridError, ScheduleGrid, SlotKey, GRID_DAYS};
pub use model::step::{
    Step, StepId, StepValidationError, PRIORITY_DEFAULT, PRIORITY_HIGHEST, PRIORITY_LOWEST,
};
pub use model::user::{PasswordHashError, UserAccount};
pub use planner::allocator::{
    allocate, AllocatedStep, Allocation, AllocationError, AllocationOutcome,
};
pub use planner::scheduler::{schedule, Placement, ScheduleOutcome, UnchangedReason};
pub use repo::goal_repo::{GoalRepository, RepoError, RepoResult, SqliteGoalRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use report::charts::{hours_per_goal, progress, timeline, GoalHours, Progress, TimelineBar};
pub use report::summary::SummaryReport;
pub use service::account_service::{AccountError, AccountService};
pub use service::goal_service::{GoalService, GoalServiceError, NewStep};
pub use session::Session;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
