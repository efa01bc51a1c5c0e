//! Calendar-year partitioning
//!
//! Splits `[earliest, export_end)` into windows aligned to calendar years so
//! every batch fetches at most one year of history.

use super::batch::Batch;
use crate::domain::ids::Category;
use crate::domain::window::{start_of_year, TimeWindow};
use chrono::{DateTime, Datelike, Utc};

/// Split `[earliest, export_end)` into calendar-year-aligned windows
///
/// The first window runs from `earliest` to the start of the following
/// year, each later window covers one full year, and the last one is clipped
/// to `export_end`. Returns no windows when `earliest >= export_end`.
///
/// # Examples
///
/// ```
/// use backfill::core::descriptor::partition::partition_windows;
/// use chrono::{TimeZone, Utc};
///
/// let earliest = Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2023, 1, 15, 0, 0, 0).unwrap();
///
/// let windows = partition_windows(earliest, end);
/// assert_eq!(windows.len(), 4);
/// assert_eq!(windows[0].label(), "2020-06-01 to 2021-01-01");
/// assert_eq!(windows[1].label(), "2021");
/// assert_eq!(windows[3].label(), "2023-01-01 to 2023-01-15");
/// ```
pub fn partition_windows(earliest: DateTime<Utc>, export_end: DateTime<Utc>) -> Vec<TimeWindow> {
    let mut windows = Vec::new();
    let mut cursor = earliest;

    while cursor < export_end {
        let Some(next_year) = start_of_year(cursor.year() + 1) else {
            break;
        };
        let end = next_year.min(export_end);
        windows.push(TimeWindow {
            start: cursor,
            end,
        });
        cursor = end;
    }

    windows
}

/// Build the batches for one category, each with the full retry budget
pub fn partition_category(
    category: &Category,
    earliest: DateTime<Utc>,
    export_end: DateTime<Utc>,
    retry_budget: u32,
) -> Vec<Batch> {
    partition_windows(earliest, export_end)
        .into_iter()
        .map(|window| Batch::new(category.clone(), window, retry_budget))
        .collect()
}
