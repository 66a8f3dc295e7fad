//! Greedy placement of steps into open weekly slots.
//!
//! Steps are taken by ascending priority (stable on ties). Each step consumes
//! open slots in grid order, one slot per started hour of its estimate, until
//! its hours are covered or no open slot is left. A consumed slot is never
//! offered again in the same run.

use crate::model::grid::{ScheduleGrid, SlotKey};
use crate::model::step::{Step, StepId};
use log::info;
use serde::Serialize;

/// Slots granted to one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub step_id: StepId,
    pub step_name: String,
    pub slots: Vec<SlotKey>,
    /// Hours left uncovered when the open slots ran out.
    pub unplaced_hours: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnchangedReason {
    NoSteps,
    NoOpenSlots,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled {
        grid: ScheduleGrid,
        placements: Vec<Placement>,
    },
    Unchanged {
        grid: ScheduleGrid,
        reason: UnchangedReason,
    },
}

impl ScheduleOutcome {
    pub fn grid(&self) -> &ScheduleGrid {
        match self {
            Self::Scheduled { grid, .. } | Self::Unchanged { grid, .. } => grid,
        }
    }

    pub fn into_grid(self) -> ScheduleGrid {
        match self {
            Self::Scheduled { grid, .. } | Self::Unchanged { grid, .. } => grid,
        }
    }
}

/// Fills open cells of a copy of `grid` with step names.
///
/// Assignments left over from an earlier run are released first; reserved
/// cells are never written.
pub fn schedule(steps: &[Step], grid: &ScheduleGrid) -> ScheduleOutcome {
    if steps.is_empty() {
        info!("event=schedule module=planner status=skipped reason=no_steps");
        return ScheduleOutcome::Unchanged {
            grid: grid.clone(),
            reason: UnchangedReason::NoSteps,
        };
    }

    let mut next = grid.clone();
    next.clear_assignments();

    let open_slots = next.open_slots();
    if open_slots.is_empty() {
        info!("event=schedule module=planner status=skipped reason=no_open_slots");
        return ScheduleOutcome::Unchanged {
            grid: grid.clone(),
            reason: UnchangedReason::NoOpenSlots,
        };
    }
    let open_count = open_slots.len();

    let mut ordered: Vec<&Step> = steps.iter().collect();
    ordered.sort_by_key(|step| step.priority);

    let mut pool = open_slots.into_iter();
    let mut placements = Vec::with_capacity(ordered.len());
    for step in ordered {
        let mut remaining = step.hours;
        let mut slots = Vec::new();
        while remaining > 0.0 {
            let Some(key) = pool.next() else {
                break;
            };
            if next.assign(key, &step.name) {
                slots.push(key);
                remaining -= 1.0;
            }
        }
        placements.push(Placement {
            step_id: step.id,
            step_name: step.name.clone(),
            slots,
            unplaced_hours: remaining.max(0.0),
        });
    }

    let assigned: usize = placements.iter().map(|placement| placement.slots.len()).sum();
    info!(
        "event=schedule module=planner status=ok steps={} open_slots={} assigned_slots={}",
        steps.len(),
        open_count,
        assigned
    );

    ScheduleOutcome::Scheduled {
        grid: next,
        placements,
    }
}
