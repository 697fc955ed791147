//! Calendar-day helpers for schedule queries and month views.
//!
//! # Responsibility
//! - Parse user-facing `YYYY-MM-DD` input into calendar days.
//! - Build timezone-independent month grids for rendering layers.
//!
//! # Invariants
//! - Days never carry a time component.
//! - Grid construction is a pure function of `(year, month)`.

use chrono::{Local, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod month_grid;

pub use month_grid::{month_grid, GridCell, MonthGrid, GRID_CELLS};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Invalid calendar input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// Input is not a valid `YYYY-MM-DD` calendar day.
    InvalidDate(String),
    /// Month outside `1..=12` or year outside the supported range.
    InvalidMonth { year: i32, month: u32 },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => {
                write!(f, "invalid calendar day `{value}`; expected YYYY-MM-DD")
            }
            Self::InvalidMonth { year, month } => {
                write!(f, "invalid calendar month {year}-{month:02}")
            }
        }
    }
}

impl Error for CalendarError {}

/// Parses a strict `YYYY-MM-DD` calendar day.
///
/// Rejects impossible days such as `2026-02-30` and any time component.
pub fn parse_day(value: &str) -> Result<NaiveDate, CalendarError> {
    let trimmed = value.trim();
    // chrono accepts non-padded fields; the storage form is always padded.
    if trimmed.len() != 10 {
        return Err(CalendarError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DAY_FORMAT)
        .map_err(|_| CalendarError::InvalidDate(value.to_string()))
}

/// Formats a day in storage form.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Today's calendar day in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Calendar-day equality used for "today" highlighting.
pub fn is_today(day: NaiveDate, today: NaiveDate) -> bool {
    day == today
}
