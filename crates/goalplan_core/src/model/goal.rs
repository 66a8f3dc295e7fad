//! Goal domain model.
//!
//! # Invariants
//! - Goal names are unique per owner (enforced by storage).
//! - `name` is non-empty after trimming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

use crate::model::step::Step;

/// Stable identifier for a goal.
pub type GoalId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    NilId,
    EmptyName,
    EmptyOwner,
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "goal id must not be nil"),
            Self::EmptyName => write!(f, "goal name must not be empty"),
            Self::EmptyOwner => write!(f, "goal owner must not be empty"),
        }
    }
}

impl Error for GoalValidationError {}

/// A named objective owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub owner: String,
    pub name: String,
}

impl Goal {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            name: name.into().trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.id.is_nil() {
            return Err(GoalValidationError::NilId);
        }
        if self.owner.trim().is_empty() {
            return Err(GoalValidationError::EmptyOwner);
        }
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        Ok(())
    }
}

/// A goal together with its ordered steps, as cached by a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPlan {
    pub goal: Goal,
    pub steps: Vec<Step>,
}
