//! Goal and step use-case service.
//!
//! # Responsibility
//! - Open sessions by loading a user's goals and steps from storage.
//! - Apply goal/step writes to storage and to the session cache together.
//!
//! # Invariants
//! - The session cache is only updated after the storage write succeeded.
//! - Creating an existing goal returns the existing goal instead of failing.
//! - Step writes are restricted to steps owned by the session user.

use crate::model::goal::{Goal, GoalId, GoalPlan, GoalValidationError};
use crate::model::grid::{GridConfig, GridError, ScheduleGrid};
use crate::model::step::{Step, StepId, StepValidationError};
use crate::repo::goal_repo::{GoalRepository, RepoError};
use crate::session::Session;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum GoalServiceError {
    InvalidGoal(GoalValidationError),
    InvalidStep(StepValidationError),
    /// No goal with this name exists for the session user.
    UnknownGoal(String),
    StepNotFound(StepId),
    Grid(GridError),
    Repo(RepoError),
}

impl Display for GoalServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGoal(err) => write!(f, "{err}"),
            Self::InvalidStep(err) => write!(f, "{err}"),
            Self::UnknownGoal(name) => write!(f, "goal `{name}` does not exist; create it first"),
            Self::StepNotFound(id) => write!(f, "step not found: {id}"),
            Self::Grid(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GoalServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGoal(err) => Some(err),
            Self::InvalidStep(err) => Some(err),
            Self::Grid(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::UnknownGoal(_) | Self::StepNotFound(_) => None,
        }
    }
}

impl From<RepoError> for GoalServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidGoal(err) => Self::InvalidGoal(err),
            RepoError::InvalidStep(err) => Self::InvalidStep(err),
            RepoError::StepNotFound(id) => Self::StepNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<GridError> for GoalServiceError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

/// Input for adding a step to an existing goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    pub name: String,
    pub hours: f64,
    pub priority: u8,
    pub deadline: NaiveDate,
}

/// Use-case service for goals, steps and sessions.
pub struct GoalService<R: GoalRepository> {
    repo: R,
}

impl<R: GoalRepository> GoalService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads `username`'s goals and builds a session with a fresh grid.
    ///
    /// Callers are expected to authenticate through `AccountService::login` first.
    pub fn open_session(
        &self,
        username: &str,
        grid_config: GridConfig,
    ) -> Result<Session, GoalServiceError> {
        let grid = ScheduleGrid::new(grid_config)?;
        let plans = self.repo.load_plans(username)?;
        info!(
            "event=session_open module=service status=ok goals={} steps={}",
            plans.len(),
            plans.iter().map(|plan| plan.steps.len()).sum::<usize>()
        );
        Ok(Session::new(username, plans, grid))
    }

    /// Re-reads goals and steps from storage; the grid is kept.
    pub fn reload(&self, session: &mut Session) -> Result<(), GoalServiceError> {
        let plans = self.repo.load_plans(session.username())?;
        session.replace_plans(plans);
        Ok(())
    }

    /// Creates a goal, or returns the existing one with the same name.
    pub fn create_goal(
        &self,
        session: &mut Session,
        name: &str,
    ) -> Result<GoalId, GoalServiceError> {
        if let Some(plan) = session.goal(name) {
            return Ok(plan.goal.id);
        }

        let goal = Goal::new(session.username(), name);
        goal.validate().map_err(GoalServiceError::InvalidGoal)?;

        let goal = match self.repo.create_goal(&goal) {
            Ok(_) => goal,
            Err(RepoError::AlreadyExists(_)) => self
                .repo
                .find_goal(session.username(), &goal.name)?
                .ok_or_else(|| GoalServiceError::UnknownGoal(goal.name.clone()))?,
            Err(err) => return Err(err.into()),
        };

        info!("event=goal_create module=service status=ok");
        let id = goal.id;
        session.push_goal(GoalPlan {
            goal,
            steps: Vec::new(),
        });
        Ok(id)
    }

    /// Appends a step to the named goal.
    pub fn add_step(
        &self,
        session: &mut Session,
        goal_name: &str,
        request: &NewStep,
    ) -> Result<StepId, GoalServiceError> {
        let goal_id = session
            .goal(goal_name)
            .map(|plan| plan.goal.id)
            .ok_or_else(|| GoalServiceError::UnknownGoal(goal_name.trim().to_string()))?;

        let step = Step::new(
            goal_id,
            request.name.trim(),
            request.hours,
            request.priority,
            request.deadline,
        );
        let id = self.repo.create_step(&step)?;

        info!(
            "event=step_create module=service status=ok priority={}",
            step.priority
        );
        if let Some(plan) = session.goal_mut(goal_id) {
            plan.steps.push(step);
        }
        Ok(id)
    }

    /// Records the check-in state of a step owned by the session user.
    pub fn set_step_done(
        &self,
        session: &mut Session,
        step_id: StepId,
        done: bool,
    ) -> Result<(), GoalServiceError> {
        if session.step(step_id).is_none() {
            return Err(GoalServiceError::StepNotFound(step_id));
        }

        self.repo.set_step_done(step_id, done)?;
        info!("event=step_check_in module=service status=ok done={done}");
        if let Some(step) = session.step_mut(step_id) {
            step.done = done;
        }
        Ok(())
    }
}
