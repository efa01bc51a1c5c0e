//! Batch model
//!
//! A batch is one category plus one bounded time window: the atomic unit of
//! fetch and process work.

use crate::domain::ids::Category;
use crate::domain::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of export work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Category the batch targets
    pub category: Category,

    /// Time window to fetch
    pub window: TimeWindow,

    /// Attempts left before the batch is dropped
    pub remaining_retries: u32,

    /// Set after a failed attempt; the batch is passed over until the next pass
    #[serde(default)]
    pub skip_until_next_attempt: bool,
}

/// Identity of a batch inside a descriptor queue
pub type BatchKey = (Category, TimeWindow);

impl Batch {
    /// Create a fresh batch with the full retry budget
    pub fn new(category: Category, window: TimeWindow, retry_budget: u32) -> Self {
        Self {
            category,
            window,
            remaining_retries: retry_budget,
            skip_until_next_attempt: false,
        }
    }

    /// The (category, window) pair that must be unique within a queue
    pub fn key(&self) -> BatchKey {
        (self.category.clone(), self.window)
    }

    /// Whether `other` names the same unit of work
    pub fn same_work(&self, other: &Batch) -> bool {
        self.category == other.category && self.window == other.window
    }

    /// Eligible batches are not skip-flagged and still have attempts left
    pub fn is_eligible(&self) -> bool {
        !self.skip_until_next_attempt && self.remaining_retries > 0
    }

    /// Whether the retry budget is spent
    pub fn is_exhausted(&self) -> bool {
        self.remaining_retries == 0
    }

    /// Record a failed attempt: one retry is consumed (floored at zero) and
    /// the batch is passed over for the rest of the current pass.
    pub fn record_failure(&mut self) {
        self.remaining_retries = self.remaining_retries.saturating_sub(1);
        self.skip_until_next_attempt = true;
    }

    /// Progress label: category plus window, years collapsed to a bare year
    pub fn label(&self) -> String {
        format!("{} {}", self.category, self.window.label())
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.category, self.window)
    }
}
