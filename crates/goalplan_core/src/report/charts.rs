//! Chart series derived from goal plans.

use crate::model::goal::GoalPlan;
use chrono::{Days, NaiveDate};
use serde::Serialize;

/// Days shown before a deadline on timeline bars.
pub const TIMELINE_LEAD_DAYS: u64 = 7;

/// Total estimated hours of one goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalHours {
    pub goal: String,
    pub hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub pending: usize,
}

impl Progress {
    pub fn total(&self) -> usize {
        self.done + self.pending
    }

    /// Share of finished steps, or `None` when there are no steps.
    pub fn completion_ratio(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.done as f64 / total as f64),
        }
    }
}

/// One bar of the goal timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineBar {
    pub goal: String,
    pub step: String,
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

/// Hours per goal, largest first. Goals without steps are left out.
pub fn hours_per_goal(plans: &[GoalPlan]) -> Vec<GoalHours> {
    let mut series: Vec<GoalHours> = plans
        .iter()
        .filter(|plan| !plan.steps.is_empty())
        .map(|plan| GoalHours {
            goal: plan.goal.name.clone(),
            hours: plan.steps.iter().map(|step| step.hours).sum(),
        })
        .collect();
    series.sort_by(|a, b| b.hours.total_cmp(&a.hours));
    series
}

pub fn progress(plans: &[GoalPlan]) -> Progress {
    let (done, pending) = plans
        .iter()
        .flat_map(|plan| plan.steps.iter())
        .fold((0, 0), |(done, pending), step| {
            if step.done {
                (done + 1, pending)
            } else {
                (done, pending + 1)
            }
        });
    Progress { done, pending }
}

/// One bar per step, spanning the week before its deadline.
pub fn timeline(plans: &[GoalPlan]) -> Vec<TimelineBar> {
    plans
        .iter()
        .flat_map(|plan| {
            plan.steps.iter().map(move |step| TimelineBar {
                goal: plan.goal.name.clone(),
                step: step.name.clone(),
                start: step
                    .deadline
                    .checked_sub_days(Days::new(TIMELINE_LEAD_DAYS))
                    .unwrap_or(step.deadline),
                finish: step.deadline,
            })
        })
        .collect()
}
