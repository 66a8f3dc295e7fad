//! Step domain model.
//!
//! # Responsibility
//! - Define the unit of work that planners allocate hours and slots to.
//! - Validate estimate, priority and naming rules before persistence.
//!
//! # Invariants
//! - `hours` is finite and strictly positive.
//! - `priority` is within `PRIORITY_HIGHEST..=PRIORITY_LOWEST`.
//! - `name` is non-empty after trimming.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::goal::GoalId;

/// Stable identifier for a step.
pub type StepId = Uuid;

/// Most urgent priority value.
pub const PRIORITY_HIGHEST: u8 = 1;
/// Least urgent priority value.
pub const PRIORITY_LOWEST: u8 = 5;
/// Priority used when callers do not pick one.
pub const PRIORITY_DEFAULT: u8 = 3;

/// Validation errors for step invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValidationError {
    NilId,
    EmptyName,
    InvalidHours(f64),
    PriorityOutOfRange(u8),
}

impl Display for StepValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "step id must not be nil"),
            Self::EmptyName => write!(f, "step name must not be empty"),
            Self::InvalidHours(hours) => {
                write!(f, "step hours must be a positive number, got {hours}")
            }
            Self::PriorityOutOfRange(priority) => write!(
                f,
                "step priority must be within {PRIORITY_HIGHEST}..={PRIORITY_LOWEST}, got {priority}"
            ),
        }
    }
}

impl Error for StepValidationError {}

/// One actionable sub-step of a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub goal_id: GoalId,
    pub name: String,
    /// Estimated effort in hours.
    pub hours: f64,
    /// 1 = high, 5 = low.
    pub priority: u8,
    pub deadline: NaiveDate,
    /// Check-in flag toggled by the user once the step is finished.
    pub done: bool,
}

impl Step {
    /// Creates a pending step with a generated ID.
    ///
    /// Call [`Step::validate`] before persisting; construction itself does not
    /// reject values so that callers can surface all errors in one place.
    pub fn new(
        goal_id: GoalId,
        name: impl Into<String>,
        hours: f64,
        priority: u8,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            name: name.into(),
            hours,
            priority,
            deadline,
            done: false,
        }
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), StepValidationError> {
        if self.id.is_nil() {
            return Err(StepValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(StepValidationError::EmptyName);
        }
        if !self.hours.is_finite() || self.hours <= 0.0 {
            return Err(StepValidationError::InvalidHours(self.hours));
        }
        if !(PRIORITY_HIGHEST..=PRIORITY_LOWEST).contains(&self.priority) {
            return Err(StepValidationError::PriorityOutOfRange(self.priority));
        }
        Ok(())
    }

    /// Whole days from `today` until the deadline, clamped to zero for
    /// deadlines that already passed.
    pub fn days_until_deadline(&self, today: NaiveDate) -> u32 {
        let days = (self.deadline - today).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }
}
