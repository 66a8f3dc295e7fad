//! Plain-text summary report of a user's goals.

use crate::model::goal::GoalPlan;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    pub step: String,
    pub hours: f64,
    pub deadline: NaiveDate,
    pub priority: u8,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub goal: String,
    pub lines: Vec<ReportLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

impl SummaryReport {
    pub fn build(username: &str, plans: &[GoalPlan]) -> Self {
        let sections = plans
            .iter()
            .map(|plan| ReportSection {
                goal: plan.goal.name.clone(),
                lines: plan
                    .steps
                    .iter()
                    .map(|step| ReportLine {
                        step: step.name.clone(),
                        hours: step.hours,
                        deadline: step.deadline,
                        priority: step.priority,
                        done: step.done,
                    })
                    .collect(),
            })
            .collect();

        Self {
            title: format!("Report - {username}"),
            sections,
        }
    }

    /// Suggested file name for an exported report.
    pub fn file_name(username: &str) -> String {
        format!("report_{username}.txt")
    }
}

impl Display for SummaryReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.title)?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "Goal: {}", section.goal)?;
            if section.lines.is_empty() {
                writeln!(f, "  (no steps)")?;
            }
            for line in &section.lines {
                writeln!(
                    f,
                    "  Step: {}, Time: {}h, Deadline: {}, Priority: {}, Done?: {}",
                    line.step,
                    line.hours,
                    line.deadline,
                    line.priority,
                    if line.done { "yes" } else { "no" }
                )?;
            }
        }
        Ok(())
    }
}
