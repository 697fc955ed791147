//! Fixed six-week month grid.
//!
//! # Invariants
//! - Every grid has exactly 42 consecutive days.
//! - The first cell is the Sunday on or before the first of the month.
//! - Cells outside the requested month are flagged `in_month = false`.

use super::CalendarError;
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Number of cells in a month grid (6 weeks x 7 days).
pub const GRID_CELLS: usize = 42;

/// One day cell of a month grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: NaiveDate,
    pub in_month: bool,
}

/// Month grid for calendar rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<GridCell>,
}

impl MonthGrid {
    /// Cells grouped into six Sunday-first weeks.
    pub fn weeks(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(7)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.cells[0].date
    }

    pub fn last_day(&self) -> NaiveDate {
        self.cells[GRID_CELLS - 1].date
    }
}

/// Builds the 42-cell grid for `(year, month)`.
pub fn month_grid(year: i32, month: u32) -> Result<MonthGrid, CalendarError> {
    let invalid = || CalendarError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let leading = u64::from(first.weekday().num_days_from_sunday());
    let start = first.checked_sub_days(Days::new(leading)).ok_or_else(invalid)?;

    let mut cells = Vec::with_capacity(GRID_CELLS);
    let mut day = start;
    for index in 0..GRID_CELLS {
        if index > 0 {
            day = day.succ_opt().ok_or_else(invalid)?;
        }
        cells.push(GridCell {
            date: day,
            in_month: day.year() == year && day.month() == month,
        });
    }

    Ok(MonthGrid { year, month, cells })
}
