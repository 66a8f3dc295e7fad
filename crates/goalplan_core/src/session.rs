//! Per-user session context.
//!
//! # Responsibility
//! - Hold the logged-in user, the cached goals/steps and the slot grid.
//! - Expose planner entry points over that cached state.
//!
//! # Invariants
//! - A session belongs to exactly one user; nothing here is shared globally.
//! - Cached plans mirror storage after every successful service write.
//! - The grid is never persisted and only changes through toggles or resets.

use crate::model::goal::{GoalPlan, GoalId};
use crate::model::grid::{Cell, GridConfig, GridError, ScheduleGrid};
use crate::model::step::{Step, StepId};
use crate::planner::allocator::{allocate, AllocationError, AllocationOutcome};
use crate::planner::scheduler::{schedule, ScheduleOutcome};
use chrono::{NaiveDate, Weekday};

#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    plans: Vec<GoalPlan>,
    grid: ScheduleGrid,
}

impl Session {
    /// Builds a session from already loaded plans.
    ///
    /// Usually created through `GoalService::open_session`.
    pub fn new(username: impl Into<String>, plans: Vec<GoalPlan>, grid: ScheduleGrid) -> Self {
        Self {
            username: username.into(),
            plans,
            grid,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn goals(&self) -> &[GoalPlan] {
        &self.plans
    }

    pub fn goal(&self, name: &str) -> Option<&GoalPlan> {
        let name = name.trim();
        self.plans.iter().find(|plan| plan.goal.name == name)
    }

    /// All steps across goals, in goal order then step order.
    pub fn steps(&self) -> Vec<Step> {
        self.plans
            .iter()
            .flat_map(|plan| plan.steps.iter().cloned())
            .collect()
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.plans
            .iter()
            .flat_map(|plan| plan.steps.iter())
            .find(|step| step.id == id)
    }

    pub fn grid(&self) -> &ScheduleGrid {
        &self.grid
    }

    /// Flips one cell between open and reserved.
    pub fn toggle_slot(&mut self, day: Weekday, hour: u8) -> Result<&Cell, GridError> {
        self.grid.toggle(day, hour)
    }

    /// Replaces the grid with a fresh all-open grid of a new shape.
    pub fn reset_grid(&mut self, config: GridConfig) -> Result<(), GridError> {
        self.grid = ScheduleGrid::new(config)?;
        Ok(())
    }

    /// Runs the hour allocator over every cached step.
    pub fn allocate(
        &self,
        budget_hours: f64,
        today: NaiveDate,
    ) -> Result<AllocationOutcome, AllocationError> {
        allocate(&self.steps(), budget_hours, today)
    }

    /// Runs the slot scheduler over every cached step and the session grid.
    ///
    /// The session grid itself is left untouched.
    pub fn schedule(&self) -> ScheduleOutcome {
        schedule(&self.steps(), &self.grid)
    }

    pub(crate) fn replace_plans(&mut self, plans: Vec<GoalPlan>) {
        self.plans = plans;
    }

    pub(crate) fn push_goal(&mut self, plan: GoalPlan) {
        self.plans.push(plan);
    }

    pub(crate) fn goal_mut(&mut self, id: GoalId) -> Option<&mut GoalPlan> {
        self.plans.iter_mut().find(|plan| plan.goal.id == id)
    }

    pub(crate) fn step_mut(&mut self, id: StepId) -> Option<&mut Step> {
        self.plans
            .iter_mut()
            .flat_map(|plan| plan.steps.iter_mut())
            .find(|step| step.id == id)
    }
}
