//! Text and JSON rendering for CLI commands.

use anyhow::Result;
use chrono::NaiveDate;
use goalplan_core::{
    AllocationOutcome, GoalHours, GoalPlan, Progress, ScheduleGrid, ScheduleOutcome, Step,
    TimelineBar, UnchangedReason,
};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

/// Chart data printed by `goalplan stats`.
#[derive(Debug, Serialize)]
pub struct StatsView {
    pub hours_per_goal: Vec<GoalHours>,
    pub progress: Progress,
    pub timeline: Vec<TimelineBar>,
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_plans(plans: &[GoalPlan]) {
    if plans.is_empty() {
        println!("No goals yet. Create one with `goalplan goal add <name>`.");
        return;
    }

    for plan in plans {
        println!("## {}", plan.goal.name);
        if plan.steps.is_empty() {
            println!("  (no steps)");
            continue;
        }
        let rows: Vec<StepRow> = plan.steps.iter().map(StepRow::from).collect();
        println!("{}", Table::new(rows));
    }
}

pub fn print_allocation(outcome: &AllocationOutcome) {
    match outcome {
        AllocationOutcome::NothingToOptimize => println!("No steps to optimize."),
        AllocationOutcome::Allocated(allocation) => {
            println!("Optimization complete.");
            for entry in &allocation.entries {
                println!("Step {}: {:.2} hours", entry.name, entry.hours);
            }
            println!(
                "Total: {:.2} of {:.2} hours",
                allocation.total_hours(),
                allocation.budget_hours
            );
        }
    }
}

pub fn print_schedule(outcome: &ScheduleOutcome) {
    match outcome {
        ScheduleOutcome::Unchanged { grid, reason } => {
            match reason {
                UnchangedReason::NoSteps => println!("No steps to place."),
                UnchangedReason::NoOpenSlots => println!("No open slots available."),
            }
            print_grid(grid);
        }
        ScheduleOutcome::Scheduled { grid, placements } => {
            print_grid(grid);
            for placement in placements.iter().filter(|p| p.unplaced_hours > 0.0) {
                println!(
                    "Step {}: {} hour(s) could not be placed",
                    placement.step_name, placement.unplaced_hours
                );
            }
        }
    }
}

pub fn print_grid(grid: &ScheduleGrid) {
    println!("{}", render_grid(grid));
}

/// Weekly grid as a table: one row per slot hour, one column per day.
fn render_grid(grid: &ScheduleGrid) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("Time".to_string()).chain(grid.days().iter().map(ToString::to_string)),
    );
    for (label, cells) in grid.rows() {
        builder.push_record(std::iter::once(label).chain(cells.iter().map(ToString::to_string)));
    }
    builder.build().to_string()
}

pub fn print_stats(stats: &StatsView) {
    println!("Hours per goal:");
    if stats.hours_per_goal.is_empty() {
        println!("  (no steps)");
    } else {
        let rows: Vec<GoalHoursRow> = stats.hours_per_goal.iter().map(GoalHoursRow::from).collect();
        println!("{}", Table::new(rows));
    }

    println!();
    match stats.progress.completion_ratio() {
        Some(ratio) => println!(
            "Progress: {} done, {} pending ({:.0}%)",
            stats.progress.done,
            stats.progress.pending,
            ratio * 100.0
        ),
        None => println!("Progress: no steps"),
    }

    if !stats.timeline.is_empty() {
        println!();
        let rows: Vec<TimelineRow> = stats.timeline.iter().map(TimelineRow::from).collect();
        println!("{}", Table::new(rows));
    }
}

/// One step line of `goalplan list`.
#[derive(Debug, Tabled)]
struct StepRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Step")]
    name: String,

    #[tabled(rename = "Hours")]
    hours: f64,

    #[tabled(rename = "Priority")]
    priority: u8,

    #[tabled(rename = "Deadline")]
    deadline: NaiveDate,

    #[tabled(rename = "Done", display = "display_done")]
    done: bool,
}

impl From<&Step> for StepRow {
    fn from(step: &Step) -> Self {
        Self {
            id: step.id.to_string(),
            name: step.name.clone(),
            hours: step.hours,
            priority: step.priority,
            deadline: step.deadline,
            done: step.done,
        }
    }
}

fn display_done(done: &bool) -> String {
    if *done { "yes" } else { "no" }.to_string()
}

#[derive(Debug, Tabled)]
struct GoalHoursRow {
    #[tabled(rename = "Goal")]
    goal: String,

    #[tabled(rename = "Hours")]
    hours: f64,
}

impl From<&GoalHours> for GoalHoursRow {
    fn from(entry: &GoalHours) -> Self {
        Self {
            goal: entry.goal.clone(),
            hours: entry.hours,
        }
    }
}

#[derive(Debug, Tabled)]
struct TimelineRow {
    #[tabled(rename = "Goal")]
    goal: String,

    #[tabled(rename = "Step")]
    step: String,

    #[tabled(rename = "Start")]
    start: NaiveDate,

    #[tabled(rename = "Finish")]
    finish: NaiveDate,
}

impl From<&TimelineBar> for TimelineRow {
    fn from(bar: &TimelineBar) -> Self {
        Self {
            goal: bar.goal.clone(),
            step: bar.step.clone(),
            start: bar.start,
            finish: bar.finish,
        }
    }
}
