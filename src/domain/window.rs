//! Half-open time windows
//!
//! A [`TimeWindow`] bounds the records one batch fetches.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open interval `[start, end)` in UTC
///
/// # Examples
///
/// ```
/// use backfill::domain::window::TimeWindow;
/// use chrono::{TimeZone, Utc};
///
/// let window = TimeWindow::calendar_year(2021).unwrap();
/// assert!(window.contains(Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()));
/// assert!(!window.contains(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()));
/// assert_eq!(window.label(), "2021");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive lower bound
    pub start: DateTime<Utc>,
    /// Exclusive upper bound
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window, rejecting empty or inverted intervals
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if start >= end {
            return Err(format!("Empty time window: {start} >= {end}"));
        }
        Ok(Self { start, end })
    }

    /// The full calendar year `[year-01-01, (year+1)-01-01)`
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start: start_of_year(year)?,
            end: start_of_year(year + 1)?,
        })
    }

    /// Whether `instant` falls inside the window
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Returns the year if the window spans exactly one calendar year
    pub fn whole_year(&self) -> Option<i32> {
        let year = self.start.year();
        match Self::calendar_year(year) {
            Some(full) if full == *self => Some(year),
            _ => None,
        }
    }

    /// Human-readable label: a bare year for whole calendar years,
    /// otherwise `YYYY-MM-DD to YYYY-MM-DD`
    pub fn label(&self) -> String {
        match self.whole_year() {
            Some(year) => year.to_string(),
            None => format!(
                "{} to {}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            ),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Midnight UTC on January 1st of `year`
pub fn start_of_year(year: i32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}
