//! Budgeted hour allocation solved as a linear program.
//!
//! Minimizes `sum(cost_i * x_i)` where `cost_i = hours_i + 10 * (priority_i - 1)`,
//! subject to:
//! - `sum(x_i) <= budget_hours`
//! - `x_i <= days_until_deadline_i` for steps whose deadline is still ahead
//! - `0 <= x_i <= hours_i`
//!
//! The deadline cap uses the day count directly as an hour ceiling.

use crate::model::step::{Step, StepId, StepValidationError};
use chrono::NaiveDate;
use log::{info, warn};
use minilp::{ComparisonOp, Error as SolverError, LinearExpr, OptimizationDirection, Problem};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Extra cost per priority level below the highest.
pub const PRIORITY_COST_WEIGHT: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// Budget is NaN or infinite.
    InvalidBudget(f64),
    InvalidStep {
        index: usize,
        source: StepValidationError,
    },
    /// No allocation satisfies the budget, deadline caps and bounds together.
    Infeasible,
    Solver(String),
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBudget(budget) => {
                write!(f, "budget must be a finite number of hours, got {budget}")
            }
            Self::InvalidStep { index, source } => write!(f, "step #{index}: {source}"),
            Self::Infeasible => write!(f, "no allocation satisfies the budget and deadlines"),
            Self::Solver(message) => write!(f, "solver failure: {message}"),
        }
    }
}

impl Error for AllocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidStep { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Hours granted to one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocatedStep {
    /// Position of the step in the input slice.
    pub index: usize,
    pub step_id: StepId,
    pub name: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub budget_hours: f64,
    /// Value of the minimized cost function.
    pub objective: f64,
    pub entries: Vec<AllocatedStep>,
}

impl Allocation {
    pub fn total_hours(&self) -> f64 {
        self.entries.iter().map(|entry| entry.hours).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "allocation", rename_all = "snake_case")]
pub enum AllocationOutcome {
    Allocated(Allocation),
    /// The step list was empty.
    NothingToOptimize,
}

/// Per-hour cost the solver minimizes for `step`.
pub fn step_cost(step: &Step) -> f64 {
    step.hours + PRIORITY_COST_WEIGHT * (f64::from(step.priority) - 1.0)
}

/// Solves the allocation problem for `steps` under `budget_hours`.
///
/// `today` anchors the days-until-deadline computation.
///
/// # Errors
/// - `InvalidBudget` for non-finite budgets.
/// - `InvalidStep` when a step breaks model invariants.
/// - `Infeasible` when no allocation satisfies every constraint.
pub fn allocate(
    steps: &[Step],
    budget_hours: f64,
    today: NaiveDate,
) -> Result<AllocationOutcome, AllocationError> {
    if steps.is_empty() {
        info!("event=allocate module=planner status=skipped reason=no_steps");
        return Ok(AllocationOutcome::NothingToOptimize);
    }
    if !budget_hours.is_finite() {
        return Err(AllocationError::InvalidBudget(budget_hours));
    }
    for (index, step) in steps.iter().enumerate() {
        step.validate()
            .map_err(|source| AllocationError::InvalidStep { index, source })?;
    }

    let started_at = Instant::now();
    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let vars: Vec<_> = steps
        .iter()
        .map(|step| problem.add_var(step_cost(step), (0.0, step.hours)))
        .collect();

    let mut budget_expr = LinearExpr::empty();
    for var in &vars {
        budget_expr.add(*var, 1.0);
    }
    problem.add_constraint(budget_expr, ComparisonOp::Le, budget_hours);

    let mut deadline_caps = 0usize;
    for (step, var) in steps.iter().zip(&vars) {
        let days = step.days_until_deadline(today);
        if days > 0 {
            let mut cap = LinearExpr::empty();
            cap.add(*var, 1.0);
            problem.add_constraint(cap, ComparisonOp::Le, f64::from(days));
            deadline_caps += 1;
        }
    }

    let solution = match problem.solve() {
        Ok(solution) => solution,
        Err(err) => {
            warn!(
                "event=allocate module=planner status=error steps={} deadline_caps={} duration_ms={} error={}",
                steps.len(),
                deadline_caps,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(match err {
                SolverError::Infeasible => AllocationError::Infeasible,
                other => AllocationError::Solver(other.to_string()),
            });
        }
    };

    let entries = steps
        .iter()
        .zip(&vars)
        .enumerate()
        .map(|(index, (step, var))| AllocatedStep {
            index,
            step_id: step.id,
            name: step.name.clone(),
            // Solver round-off can land a hair outside the bounds.
            hours: solution[*var].clamp(0.0, step.hours),
        })
        .collect();

    info!(
        "event=allocate module=planner status=ok steps={} deadline_caps={} duration_ms={}",
        steps.len(),
        deadline_caps,
        started_at.elapsed().as_millis()
    );

    Ok(AllocationOutcome::Allocated(Allocation {
        budget_hours,
        objective: solution.objective(),
        entries,
    }))
}
