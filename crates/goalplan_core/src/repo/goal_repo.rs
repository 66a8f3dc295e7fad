//! Goal/step repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `goals` and `steps` storage.
//! - Keep step order stable per goal through the `position` column.
//!
//! # Invariants
//! - `create_goal` and `create_step` validate before inserting.
//! - Goals list in creation order; steps list by `position`.

use crate::db::DbError;
use crate::model::goal::{Goal, GoalId, GoalPlan, GoalValidationError};
use crate::model::step::{Step, StepId, StepValidationError};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEADLINE_FORMAT: &str = "%Y-%m-%d";

const STEP_SELECT_SQL: &str = "SELECT
    uuid,
    goal_uuid,
    name,
    hours,
    priority,
    deadline,
    is_done
FROM steps";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for account, goal and step persistence.
#[derive(Debug)]
pub enum RepoError {
    InvalidGoal(GoalValidationError),
    InvalidStep(StepValidationError),
    Db(DbError),
    GoalNotFound(GoalId),
    StepNotFound(StepId),
    AlreadyExists(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGoal(err) => write!(f, "{err}"),
            Self::InvalidStep(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::GoalNotFound(id) => write!(f, "goal not found: {id}"),
            Self::StepNotFound(id) => write!(f, "step not found: {id}"),
            Self::AlreadyExists(what) => write!(f, "already exists: {what}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGoal(err) => Some(err),
            Self::InvalidStep(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::GoalNotFound(_)
            | Self::StepNotFound(_)
            | Self::AlreadyExists(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<GoalValidationError> for RepoError {
    fn from(value: GoalValidationError) -> Self {
        Self::InvalidGoal(value)
    }
}

impl From<StepValidationError> for RepoError {
    fn from(value: StepValidationError) -> Self {
        Self::InvalidStep(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for goals and their steps.
pub trait GoalRepository {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId>;
    fn find_goal(&self, owner: &str, name: &str) -> RepoResult<Option<Goal>>;
    fn list_goals(&self, owner: &str) -> RepoResult<Vec<Goal>>;
    fn create_step(&self, step: &Step) -> RepoResult<StepId>;
    fn get_step(&self, id: StepId) -> RepoResult<Option<Step>>;
    fn list_steps(&self, goal_id: GoalId) -> RepoResult<Vec<Step>>;
    fn set_step_done(&self, id: StepId, done: bool) -> RepoResult<()>;

    /// Loads every goal of `owner` with its ordered steps.
    fn load_plans(&self, owner: &str) -> RepoResult<Vec<GoalPlan>> {
        self.list_goals(owner)?
            .into_iter()
            .map(|goal| {
                let steps = self.list_steps(goal.id)?;
                Ok::<_, RepoError>(GoalPlan { goal, steps })
            })
            .collect()
    }
}

/// SQLite-backed goal repository.
pub struct SqliteGoalRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGoalRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl GoalRepository for SqliteGoalRepository<'_> {
    fn create_goal(&self, goal: &Goal) -> RepoResult<GoalId> {
        goal.validate()?;

        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO goals (uuid, owner, name) VALUES (?1, ?2, ?3);",
            params![goal.id.to_string(), goal.owner.as_str(), goal.name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::AlreadyExists(format!("goal `{}`", goal.name)));
        }

        Ok(goal.id)
    }

    fn find_goal(&self, owner: &str, name: &str) -> RepoResult<Option<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, owner, name FROM goals WHERE owner = ?1 AND name = ?2;",
        )?;
        let mut rows = stmt.query(params![owner, name.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_goal_row(row)?));
        }
        Ok(None)
    }

    fn list_goals(&self, owner: &str) -> RepoResult<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, owner, name
             FROM goals
             WHERE owner = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([owner])?;
        let mut goals = Vec::new();
        while let Some(row) = rows.next()? {
            goals.push(parse_goal_row(row)?);
        }
        Ok(goals)
    }

    fn create_step(&self, step: &Step) -> RepoResult<StepId> {
        step.validate()?;

        let goal_exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM goals WHERE uuid = ?1;",
                [step.goal_id.to_string()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !goal_exists {
            return Err(RepoError::GoalNotFound(step.goal_id));
        }

        self.conn.execute(
            "INSERT INTO steps (
                uuid,
                goal_uuid,
                name,
                hours,
                priority,
                deadline,
                is_done,
                position
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                (SELECT COUNT(*) FROM steps WHERE goal_uuid = ?2)
            );",
            params![
                step.id.to_string(),
                step.goal_id.to_string(),
                step.name.as_str(),
                step.hours,
                i64::from(step.priority),
                step.deadline.format(DEADLINE_FORMAT).to_string(),
                bool_to_int(step.done),
            ],
        )?;

        Ok(step.id)
    }

    fn get_step(&self, id: StepId) -> RepoResult<Option<Step>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STEP_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_step_row(row)?));
        }
        Ok(None)
    }

    fn list_steps(&self, goal_id: GoalId) -> RepoResult<Vec<Step>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STEP_SELECT_SQL} WHERE goal_uuid = ?1 ORDER BY position ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([goal_id.to_string()])?;
        let mut steps = Vec::new();
        while let Some(row) = rows.next()? {
            steps.push(parse_step_row(row)?);
        }
        Ok(steps)
    }

    fn set_step_done(&self, id: StepId, done: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE steps
             SET
                is_done = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![bool_to_int(done), id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::StepNotFound(id));
        }

        Ok(())
    }
}

fn parse_uuid(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

fn parse_goal_row(row: &Row<'_>) -> RepoResult<Goal> {
    let goal = Goal {
        id: parse_uuid(row, "uuid", "goals")?,
        owner: row.get("owner")?,
        name: row.get("name")?,
    };
    goal.validate()?;
    Ok(goal)
}

fn parse_step_row(row: &Row<'_>) -> RepoResult<Step> {
    let deadline_text: String = row.get("deadline")?;
    let deadline = NaiveDate::parse_from_str(&deadline_text, DEADLINE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid deadline `{deadline_text}` in steps.deadline"
        ))
    })?;

    let priority_value: i64 = row.get("priority")?;
    let priority = u8::try_from(priority_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_value}` in steps.priority"
        ))
    })?;

    let done = match row.get::<_, i64>("is_done")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_done value `{other}` in steps.is_done"
            )));
        }
    };

    let step = Step {
        id: parse_uuid(row, "uuid", "steps")?,
        goal_id: parse_uuid(row, "goal_uuid", "steps")?,
        name: row.get("name")?,
        hours: row.get("hours")?,
        priority,
        deadline,
        done,
    };
    step.validate()?;
    Ok(step)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
