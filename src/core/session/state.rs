//! Session state and progress reporting types

use crate::core::descriptor::Batch;
use crate::domain::ids::Category;
use crate::domain::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a session
///
/// `Scheduled → Running` on start, `Running → Paused` when a pause is
/// observed between batches, `Paused → Running` on a later start and
/// `Running → Done` once the queue is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, never started
    #[default]
    Scheduled,
    /// Run loop active
    Running,
    /// Run loop stopped at a batch boundary; can be restarted
    Paused,
    /// Queue exhausted
    Done,
}

impl SessionState {
    /// Whether the run loop is active
    pub fn is_running(self) -> bool {
        self == SessionState::Running
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Scheduled => "scheduled",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Running totals for one session object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportCounters {
    /// Batches processed and accepted by the result handler
    pub completed: usize,
    /// Failed attempts (query, process or rejected), including final ones
    pub failed_attempts: usize,
    /// Batches dropped after spending their retry budget
    pub dropped: usize,
    /// Descriptor writes that failed
    pub persistence_failures: usize,
}

/// Read-only view of the batch currently being worked on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// 1-based position of the current batch in this run
    pub index: usize,
    /// Batches in this run: completed so far plus still pending
    pub total: usize,
    /// Category and window, e.g. `heart_rate 2021`
    pub label: String,
    /// Category of the current batch
    pub category: Category,
    /// Window of the current batch
    pub window: TimeWindow,
    /// Totals at the time of the snapshot
    pub counters: ExportCounters,
}

impl ProgressSnapshot {
    pub(crate) fn for_batch(
        batch: &Batch,
        index: usize,
        total: usize,
        counters: ExportCounters,
    ) -> Self {
        Self {
            index,
            total,
            label: batch.label(),
            category: batch.category.clone(),
            window: batch.window,
            counters,
        }
    }

    /// Completed fraction of this run in `[0, 1]`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.index.saturating_sub(1) as f64 / self.total as f64).min(1.0)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.index, self.total, self.label)
    }
}
