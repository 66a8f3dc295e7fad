//! Weekly slot grid used by the slot scheduler.
//!
//! # Responsibility
//! - Model the fixed Monday..Saturday grid of hour-labelled time slots.
//! - Provide open/reserved toggles for user slot selection.
//!
//! # Invariants
//! - Cells are stored row-major: time slot outer, day inner.
//! - Only `toggle` can turn a `Reserved` cell into anything else.
//! - `assign` only writes `Open` cells.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Columns of every grid, in display order.
pub const GRID_DAYS: [Weekday; 6] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const MAX_HOUR: u8 = 23;
const MIN_INTERVAL_HOURS: u8 = 1;
const MAX_INTERVAL_HOURS: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    InvalidHour(u8),
    InvertedRange { start_hour: u8, end_hour: u8 },
    InvalidInterval(u8),
    InvalidSlot(String),
    UnknownSlot(SlotKey),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidHour(hour) => write!(f, "hour must be within 0..={MAX_HOUR}, got {hour}"),
            Self::InvertedRange {
                start_hour,
                end_hour,
            } => write!(
                f,
                "start hour {start_hour} must not be after end hour {end_hour}"
            ),
            Self::InvalidInterval(interval) => write!(
                f,
                "interval must be within {MIN_INTERVAL_HOURS}..={MAX_INTERVAL_HOURS} hours, got {interval}"
            ),
            Self::InvalidSlot(value) => {
                write!(f, "invalid slot `{value}`; expected DAY@HOUR, e.g. Mon@6")
            }
            Self::UnknownSlot(key) => write!(f, "slot {key} is not part of the grid"),
        }
    }
}

impl Error for GridError {}

/// Shape of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub start_hour: u8,
    /// Inclusive: a slot starting at `end_hour` exists when the interval lands on it.
    pub end_hour: u8,
    pub interval_hours: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 22,
            interval_hours: 2,
        }
    }
}

impl GridConfig {
    pub fn new(start_hour: u8, end_hour: u8, interval_hours: u8) -> Result<Self, GridError> {
        let config = Self {
            start_hour,
            end_hour,
            interval_hours,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.start_hour > MAX_HOUR {
            return Err(GridError::InvalidHour(self.start_hour));
        }
        if self.end_hour > MAX_HOUR {
            return Err(GridError::InvalidHour(self.end_hour));
        }
        if self.start_hour > self.end_hour {
            return Err(GridError::InvertedRange {
                start_hour: self.start_hour,
                end_hour: self.end_hour,
            });
        }
        if !(MIN_INTERVAL_HOURS..=MAX_INTERVAL_HOURS).contains(&self.interval_hours) {
            return Err(GridError::InvalidInterval(self.interval_hours));
        }
        Ok(())
    }

    /// Start hours of every time slot row.
    pub fn slot_hours(&self) -> Vec<u8> {
        (self.start_hour..=self.end_hour)
            .step_by(usize::from(self.interval_hours))
            .collect()
    }
}

/// Content of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum Cell {
    Open,
    Reserved,
    /// Holds the name of the step placed here by the scheduler.
    Assigned(String),
}

impl Cell {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::Reserved)
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Reserved => write!(f, "reserved"),
            Self::Assigned(step) => write!(f, "{step}"),
        }
    }
}

/// Address of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: Weekday,
    pub hour: u8,
}

impl SlotKey {
    pub fn new(day: Weekday, hour: u8) -> Self {
        Self { day, hour }
    }
}

impl Display for SlotKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.day, slot_label(self.hour))
    }
}

/// Parses `DAY@HOUR`, where `HOUR` may carry a `:00` suffix.
impl FromStr for SlotKey {
    type Err = GridError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || GridError::InvalidSlot(value.to_string());
        let (day_text, hour_text) = value.trim().split_once('@').ok_or_else(invalid)?;
        let day = Weekday::from_str(day_text.trim()).map_err(|_| invalid())?;
        let hour_text = hour_text.trim();
        let hour_text = hour_text.strip_suffix(":00").unwrap_or(hour_text);
        let hour = hour_text.parse::<u8>().map_err(|_| invalid())?;
        Ok(Self { day, hour })
    }
}

/// Row label for a slot starting at `hour`.
pub fn slot_label(hour: u8) -> String {
    format!("{hour}:00")
}

/// Weekly grid of open, reserved and assigned cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleGrid {
    config: GridConfig,
    hours: Vec<u8>,
    cells: Vec<Cell>,
}

impl ScheduleGrid {
    /// Creates a grid with every cell open.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let hours = config.slot_hours();
        let cells = vec![Cell::Open; hours.len() * GRID_DAYS.len()];
        Ok(Self {
            config,
            hours,
            cells,
        })
    }

    pub fn config(&self) -> GridConfig {
        self.config
    }

    pub fn days(&self) -> &'static [Weekday] {
        &GRID_DAYS
    }

    pub fn hours(&self) -> &[u8] {
        &self.hours
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, day: Weekday, hour: u8) -> Option<&Cell> {
        self.index_of(SlotKey::new(day, hour))
            .map(|index| &self.cells[index])
    }

    /// Flips a cell between open and reserved.
    ///
    /// An assigned cell is released back to open, matching the behavior of
    /// toggling anything that is not currently open.
    pub fn toggle(&mut self, day: Weekday, hour: u8) -> Result<&Cell, GridError> {
        let key = SlotKey::new(day, hour);
        let index = self.index_of(key).ok_or(GridError::UnknownSlot(key))?;
        let cell = &mut self.cells[index];
        *cell = match cell {
            Cell::Open => Cell::Reserved,
            Cell::Reserved | Cell::Assigned(_) => Cell::Open,
        };
        Ok(&self.cells[index])
    }

    /// Iterates cells in row-major order (time slot outer, day inner).
    pub fn iter(&self) -> impl Iterator<Item = (SlotKey, &Cell)> + '_ {
        self.cells.iter().enumerate().map(|(index, cell)| {
            let hour = self.hours[index / GRID_DAYS.len()];
            let day = GRID_DAYS[index % GRID_DAYS.len()];
            (SlotKey::new(day, hour), cell)
        })
    }

    /// Open cells in iteration order.
    pub fn open_slots(&self) -> Vec<SlotKey> {
        self.iter()
            .filter(|(_, cell)| cell.is_open())
            .map(|(key, _)| key)
            .collect()
    }

    pub fn count_open(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_open()).count()
    }

    pub fn count_reserved(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_reserved()).count()
    }

    /// Number of cells holding `step_name`.
    pub fn count_assigned_to(&self, step_name: &str) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Cell::Assigned(name) if name == step_name))
            .count()
    }

    /// Rows of `(label, cells)` for table rendering.
    pub fn rows(&self) -> Vec<(String, &[Cell])> {
        self.hours
            .iter()
            .zip(self.cells.chunks(GRID_DAYS.len()))
            .map(|(hour, cells)| (slot_label(*hour), cells))
            .collect()
    }

    /// Writes `step_name` into an open cell. Returns `false` for any other cell.
    pub(crate) fn assign(&mut self, key: SlotKey, step_name: &str) -> bool {
        let Some(index) = self.index_of(key) else {
            return false;
        };
        if !self.cells[index].is_open() {
            return false;
        }
        self.cells[index] = Cell::Assigned(step_name.to_string());
        true
    }

    /// Releases every assigned cell back to open; reserved cells stay.
    pub(crate) fn clear_assignments(&mut self) {
        for cell in &mut self.cells {
            if matches!(cell, Cell::Assigned(_)) {
                *cell = Cell::Open;
            }
        }
    }

    fn index_of(&self, key: SlotKey) -> Option<usize> {
        let column = GRID_DAYS.iter().position(|day| *day == key.day)?;
        let row = self.hours.iter().position(|hour| *hour == key.hour)?;
        Some(row * GRID_DAYS.len() + column)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cell, GridConfig, GridError, ScheduleGrid, SlotKey};
    use chrono::Weekday;

    #[test]
    fn default_config_matches_six_to_twenty_two_every_two_hours() {
        let hours = GridConfig::default().slot_hours();
        assert_eq!(hours, vec![6, 8, 10, 12, 14, 16, 18, 20, 22]);
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        assert_eq!(
            GridConfig::new(10, 8, 1),
            Err(GridError::InvertedRange {
                start_hour: 10,
                end_hour: 8
            })
        );
        assert_eq!(GridConfig::new(6, 24, 1), Err(GridError::InvalidHour(24)));
        assert_eq!(GridConfig::new(6, 22, 0), Err(GridError::InvalidInterval(0)));
        assert_eq!(GridConfig::new(6, 22, 4), Err(GridError::InvalidInterval(4)));
    }

    #[test]
    fn toggle_flips_between_open_and_reserved() {
        let mut grid = ScheduleGrid::new(GridConfig::default()).unwrap();
        assert_eq!(grid.toggle(Weekday::Tue, 8).unwrap(), &Cell::Reserved);
        assert_eq!(grid.count_reserved(), 1);
        assert_eq!(grid.toggle(Weekday::Tue, 8).unwrap(), &Cell::Open);
        assert_eq!(grid.count_reserved(), 0);
    }

    #[test]
    fn toggle_rejects_cells_outside_the_grid() {
        let mut grid = ScheduleGrid::new(GridConfig::default()).unwrap();
        let err = grid.toggle(Weekday::Sun, 6).unwrap_err();
        assert_eq!(err, GridError::UnknownSlot(SlotKey::new(Weekday::Sun, 6)));
        assert!(grid.toggle(Weekday::Mon, 7).is_err());
    }

    #[test]
    fn iteration_is_time_major() {
        let grid = ScheduleGrid::new(GridConfig::new(6, 8, 2).unwrap()).unwrap();
        let keys: Vec<SlotKey> = grid.iter().map(|(key, _)| key).take(7).collect();
        assert_eq!(keys[0], SlotKey::new(Weekday::Mon, 6));
        assert_eq!(keys[5], SlotKey::new(Weekday::Sat, 6));
        assert_eq!(keys[6], SlotKey::new(Weekday::Mon, 8));
    }

    #[test]
    fn assign_never_touches_reserved_cells() {
        let mut grid = ScheduleGrid::new(GridConfig::default()).unwrap();
        grid.toggle(Weekday::Mon, 6).unwrap();
        assert!(!grid.assign(SlotKey::new(Weekday::Mon, 6), "write"));
        assert!(grid.assign(SlotKey::new(Weekday::Tue, 6), "write"));
        assert!(!grid.assign(SlotKey::new(Weekday::Tue, 6), "other"));
        grid.clear_assignments();
        assert_eq!(grid.cell(Weekday::Mon, 6), Some(&Cell::Reserved));
        assert_eq!(grid.cell(Weekday::Tue, 6), Some(&Cell::Open));
    }

    #[test]
    fn slot_key_parses_day_and_hour() {
        assert_eq!(
            "Mon@6".parse::<SlotKey>().unwrap(),
            SlotKey::new(Weekday::Mon, 6)
        );
        assert_eq!(
            "friday@14:00".parse::<SlotKey>().unwrap(),
            SlotKey::new(Weekday::Fri, 14)
        );
        assert!("Mon6".parse::<SlotKey>().is_err());
        assert!("Xyz@6".parse::<SlotKey>().is_err());
    }

    #[test]
    fn cell_serializes_with_state_tag() {
        let json = serde_json::to_value(Cell::Assigned("read".to_string())).unwrap();
        assert_eq!(json["state"], "assigned");
        assert_eq!(json["step"], "read");
        let json = serde_json::to_value(Cell::Reserved).unwrap();
        assert_eq!(json["state"], "reserved");
    }
}
