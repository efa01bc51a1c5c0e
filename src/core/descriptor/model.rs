//! Descriptor model
//!
//! The descriptor is the single durable source of truth for a session: the
//! fixed export end, the ordered queue of pending batches and the set of
//! categories with nothing left to do.
//!
//! Every mutating method leaves the invariants intact:
//! - a (category, window) pair appears at most once in the queue
//! - completed categories never appear in the queue
//! - no queued batch has an exhausted retry budget

use super::batch::{Batch, BatchKey};
use super::partition::partition_category;
use crate::domain::ids::{Category, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};

/// What happened to a batch after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Moved to the tail of the queue with `remaining` attempts left
    Requeued {
        /// Attempts left
        remaining: u32,
    },
    /// Retry budget spent; removed from the queue
    Dropped {
        /// Set when the drop removed the category's last pending batch
        category_finished: bool,
    },
}

/// Persisted, partitioned work model for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Owning session
    pub session_id: SessionId,

    /// Upper bound of every window; fixed when the descriptor is created
    pub export_end: DateTime<Utc>,

    pending_batches: VecDeque<Batch>,

    completed_categories: BTreeSet<Category>,
}

impl Descriptor {
    /// Empty descriptor for `session_id` exporting up to `export_end`
    pub fn new(session_id: SessionId, export_end: DateTime<Utc>) -> Self {
        Self {
            session_id,
            export_end,
            pending_batches: VecDeque::new(),
            completed_categories: BTreeSet::new(),
        }
    }

    /// Remaining work, head first
    pub fn pending_batches(&self) -> &VecDeque<Batch> {
        &self.pending_batches
    }

    /// Categories with no pending batches left
    pub fn completed_categories(&self) -> &BTreeSet<Category> {
        &self.completed_categories
    }

    /// Number of queued batches
    pub fn pending_len(&self) -> usize {
        self.pending_batches.len()
    }

    /// Whether the queue is empty
    pub fn is_finished(&self) -> bool {
        self.pending_batches.is_empty()
    }

    /// Number of queued batches that can be attempted right now
    pub fn eligible_count(&self) -> usize {
        self.pending_batches.iter().filter(|b| b.is_eligible()).count()
    }

    /// Whether `category` is already accounted for, pending or completed
    pub fn is_represented(&self, category: &Category) -> bool {
        self.completed_categories.contains(category)
            || self.pending_batches.iter().any(|b| &b.category == category)
    }

    /// Partition `category` from `earliest` up to the fixed export end and
    /// append its batches to the queue
    ///
    /// Re-adding a represented category is a no-op. A category whose range is
    /// empty goes straight to the completed set. Returns the number of
    /// batches appended.
    pub fn add_category(
        &mut self,
        category: &Category,
        earliest: DateTime<Utc>,
        retry_budget: u32,
    ) -> usize {
        if self.is_represented(category) {
            return 0;
        }

        let batches = partition_category(category, earliest, self.export_end, retry_budget);
        if batches.is_empty() || retry_budget == 0 {
            self.completed_categories.insert(category.clone());
            return 0;
        }

        let mut added = 0;
        for batch in batches {
            if self.push_batch(batch) {
                added += 1;
            }
        }
        added
    }

    /// Append a single batch unless it duplicates queued work, targets a
    /// completed category or has no attempts left
    pub fn push_batch(&mut self, batch: Batch) -> bool {
        if batch.is_exhausted()
            || self.completed_categories.contains(&batch.category)
            || self.pending_batches.iter().any(|b| b.same_work(&batch))
        {
            return false;
        }
        self.pending_batches.push_back(batch);
        true
    }

    /// Clear every skip flag, keeping retry counters. Returns whether any
    /// flag was set.
    pub fn clear_skip_flags(&mut self) -> bool {
        let mut changed = false;
        for batch in self.pending_batches.iter_mut() {
            if batch.skip_until_next_attempt {
                batch.skip_until_next_attempt = false;
                changed = true;
            }
        }
        changed
    }

    /// Whether a skip-flagged batch could run again once flags are cleared
    pub fn has_deferred_batches(&self) -> bool {
        self.pending_batches
            .iter()
            .any(|b| b.skip_until_next_attempt && !b.is_exhausted())
    }

    /// Remove batches whose retry budget is already spent
    ///
    /// Only reachable through externally edited or legacy descriptors;
    /// ordinary failures drop the batch as soon as the budget hits zero.
    pub fn purge_exhausted(&mut self) -> Vec<Batch> {
        let (exhausted, keep): (Vec<Batch>, Vec<Batch>) = self
            .pending_batches
            .drain(..)
            .partition(|b| b.is_exhausted());
        self.pending_batches = keep.into();
        for batch in &exhausted {
            self.finish_category_if_drained(&batch.category);
        }
        exhausted
    }

    /// Bring the first eligible batch to the head of the queue and return it
    ///
    /// The head is returned as-is when eligible. Otherwise the queue is
    /// scanned forward and the first eligible batch is rotated to the front.
    pub fn promote_next_eligible(&mut self) -> Option<Batch> {
        let position = self.pending_batches.iter().position(|b| b.is_eligible())?;
        if position > 0 {
            let batch = self.pending_batches.remove(position)?;
            self.pending_batches.push_front(batch);
        }
        self.pending_batches.front().cloned()
    }

    /// Remove a successfully delivered batch
    ///
    /// Returns the category when this was its last pending batch; the
    /// category then moves to the completed set.
    pub fn complete_batch(&mut self, batch: &Batch) -> Option<Category> {
        let position = self.position_of(batch)?;
        let removed = self.pending_batches.remove(position)?;
        if self.finish_category_if_drained(&removed.category) {
            Some(removed.category)
        } else {
            None
        }
    }

    /// Apply a failed attempt to `batch`
    ///
    /// One retry is consumed. With attempts left the batch is skip-flagged
    /// and moved to the tail; otherwise it is dropped from the queue.
    /// Returns `None` when the batch is no longer queued.
    pub fn fail_batch(&mut self, batch: &Batch) -> Option<FailureOutcome> {
        let position = self.position_of(batch)?;
        let mut failed = self.pending_batches.remove(position)?;
        failed.record_failure();

        if failed.is_exhausted() {
            let category_finished = self.finish_category_if_drained(&failed.category);
            return Some(FailureOutcome::Dropped { category_finished });
        }

        let remaining = failed.remaining_retries;
        self.pending_batches.push_back(failed);
        Some(FailureOutcome::Requeued { remaining })
    }

    /// Check the queue invariants, e.g. after loading a persisted blob
    pub fn validate(&self) -> Result<(), String> {
        let mut seen: HashSet<BatchKey> = HashSet::new();
        for batch in &self.pending_batches {
            if !seen.insert(batch.key()) {
                return Err(format!("Duplicate pending batch: {batch}"));
            }
            if self.completed_categories.contains(&batch.category) {
                return Err(format!(
                    "Category '{}' is both completed and pending",
                    batch.category
                ));
            }
            if batch.window.start >= batch.window.end {
                return Err(format!("Batch has an empty window: {batch}"));
            }
        }
        Ok(())
    }

    fn position_of(&self, batch: &Batch) -> Option<usize> {
        self.pending_batches.iter().position(|b| b.same_work(batch))
    }

    fn finish_category_if_drained(&mut self, category: &Category) -> bool {
        if self.pending_batches.iter().any(|b| &b.category == category) {
            return false;
        }
        self.completed_categories.insert(category.clone())
    }
}
