use chrono::{Days, NaiveDate};
use goalplan_core::{
    allocate, schedule, AllocationError, AllocationOutcome, Cell, GridConfig, ScheduleGrid,
    ScheduleOutcome, SlotKey, Step,
};
use proptest::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

const EPSILON: f64 = 1e-6;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn step_due_in(name: &str, hours: f64, priority: u8, days: i64) -> Step {
    let deadline = if days >= 0 {
        today().checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        today().checked_sub_days(Days::new(days.unsigned_abs())).unwrap()
    };
    Step::new(Uuid::new_v4(), name, hours, priority, deadline)
}

fn step_strategy() -> impl Strategy<Value = (f64, u8, i64)> {
    (0.5f64..20.0, 1u8..=5, -5i64..30)
}

fn build_steps(rows: &[(f64, u8, i64)]) -> Vec<Step> {
    rows
        .iter()
        .enumerate()
        .map(|(index, (hours, priority, days))| {
            step_due_in(&format!("step-{index}"), *hours, *priority, *days)
        })
        .collect()
}

fn grid_strategy() -> impl Strategy<Value = (GridConfig, Vec<bool>)> {
    (0u8..=20, 0u8..=3, 1u8..=3, prop::collection::vec(any::<bool>(), 144)).prop_map(
        |(start, span, interval, reserved)| {
            let config = GridConfig::new(start, start + span, interval).unwrap();
            (config, reserved)
        },
    )
}

fn build_grid(config: GridConfig, reserved: &[bool]) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new(config).unwrap();
    let keys: Vec<SlotKey> = grid.iter().map(|(key, _)| key).collect();
    for (key, reserve) in keys.into_iter().zip(reserved) {
        if *reserve {
            grid.toggle(key.day, key.hour).unwrap();
        }
    }
    grid
}

#[test]
fn allocation_example_favors_high_priority() {
    let steps = [
        step_due_in("urgent", 2.0, 1, 10),
        step_due_in("later", 3.0, 3, 10),
    ];

    let outcome = allocate(&steps, 4.0, today()).unwrap();
    let AllocationOutcome::Allocated(allocation) = outcome else {
        panic!("expected an allocation");
    };
    assert_eq!(allocation.entries.len(), 2);
    assert!(allocation.total_hours() <= 4.0 + EPSILON);
    let urgent_share = allocation.entries[0].hours / steps[0].hours;
    let later_share = allocation.entries[1].hours / steps[1].hours;
    assert!(urgent_share + EPSILON >= later_share);
    assert_eq!(allocation.entries[0].name, "urgent");
    assert_eq!(allocation.entries[1].step_id, steps[1].id);
}

#[test]
fn past_deadlines_add_no_cap() {
    let steps = [step_due_in("overdue", 2.0, 1, -3)];
    let outcome = allocate(&steps, 10.0, today()).unwrap();
    assert!(matches!(outcome, AllocationOutcome::Allocated(_)));
}

#[test]
fn schedule_example_fills_three_of_five_open_slots() {
    let mut grid = ScheduleGrid::new(GridConfig::new(9, 9, 1).unwrap()).unwrap();
    grid.toggle(chrono::Weekday::Tue, 9).unwrap();
    assert_eq!(grid.count_open(), 5);

    let steps = [step_due_in("write", 3.0, 1, 10)];
    let outcome = schedule(&steps, &grid);
    let result = outcome.grid();

    assert_eq!(result.count_assigned_to("write"), 3);
    assert_eq!(result.cell(chrono::Weekday::Tue, 9), Some(&Cell::Reserved));
    assert_eq!(result.count_open(), 2);
    assert_eq!(
        result.cell(chrono::Weekday::Mon, 9),
        Some(&Cell::Assigned("write".to_string()))
    );
    assert_eq!(
        result.cell(chrono::Weekday::Thu, 9),
        Some(&Cell::Assigned("write".to_string()))
    );
    // The input grid is left as it was.
    assert_eq!(grid.count_open(), 5);
}

proptest! {
    #[test]
    fn allocation_respects_bounds_budget_and_deadlines(
        rows in prop::collection::vec(step_strategy(), 1..8),
        budget in 0.0f64..100.0,
    ) {
        let steps = build_steps(&rows);
        let allocation = match allocate(&steps, budget, today()) {
            Ok(AllocationOutcome::Allocated(allocation)) => allocation,
            other => return Err(TestCaseError::fail(format!("unexpected outcome: {other:?}"))),
        };

        prop_assert_eq!(allocation.entries.len(), steps.len());
        for (entry, step) in allocation.entries.iter().zip(&steps) {
            prop_assert!(entry.hours >= 0.0);
            prop_assert!(entry.hours <= step.hours);
            let days = step.days_until_deadline(today());
            if days > 0 {
                prop_assert!(entry.hours <= f64::from(days) + EPSILON);
            }
        }
        prop_assert!(allocation.total_hours() <= budget + EPSILON);
    }

    #[test]
    fn negative_budget_is_always_infeasible(
        rows in prop::collection::vec(step_strategy(), 1..8),
        budget in -100.0f64..-0.01,
    ) {
        let steps = build_steps(&rows);
        prop_assert_eq!(allocate(&steps, budget, today()), Err(AllocationError::Infeasible));
    }

    #[test]
    fn scheduler_never_touches_reserved_cells_or_reuses_slots(
        (config, reserved) in grid_strategy(),
        rows in prop::collection::vec((0.5f64..6.0, 1u8..=5), 0..10),
    ) {
        let grid = build_grid(config, &reserved);
        let steps: Vec<Step> = rows
            .iter()
            .enumerate()
            .map(|(index, (hours, priority))| step_due_in(&format!("step-{index}"), *hours, *priority, 7))
            .collect();

        let outcome = schedule(&steps, &grid);
        let result = outcome.grid();

        for ((key, before), (_, after)) in grid.iter().zip(result.iter()) {
            if before.is_reserved() {
                prop_assert!(after.is_reserved(), "reserved cell {} was overwritten", key);
            } else {
                prop_assert!(!after.is_reserved());
            }
        }

        if let ScheduleOutcome::Scheduled { placements, .. } = &outcome {
            let mut seen = HashSet::new();
            for placement in placements {
                let step = steps.iter().find(|step| step.id == placement.step_id).unwrap();
                prop_assert!(placement.slots.len() as f64 <= step.hours.ceil());
                prop_assert_eq!(result.count_assigned_to(&step.name), placement.slots.len());
                for slot in &placement.slots {
                    prop_assert!(seen.insert(*slot), "slot {} assigned twice", slot);
                }
            }
            prop_assert_eq!(seen.len() + result.count_open(), grid.count_open());
        }
    }
}
