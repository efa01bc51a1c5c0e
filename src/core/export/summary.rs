//! Export summary and reporting
//!
//! This module defines the report produced when an export run stops.

use crate::adapters::processor::Processor;
use crate::core::session::{ExportCounters, Session, SessionState};
use crate::domain::ids::SessionId;
use std::time::Duration;

/// Summary of one export run
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Session the run belonged to
    pub session_id: SessionId,

    /// State the session stopped in
    pub final_state: SessionState,

    /// Completed, failed and dropped totals
    pub counters: ExportCounters,

    /// Batches still queued (non-zero after a pause)
    pub remaining_batches: usize,

    /// Categories with no batches left
    pub completed_categories: usize,

    /// Records handed to the result handler
    pub records_exported: usize,

    /// Output files written
    pub files_written: usize,

    /// Duration of the run
    pub duration: Duration,
}

impl ExportSummary {
    /// Capture the current state of `session`
    pub fn from_session<P: Processor>(session: &Session<P>) -> Self {
        let descriptor = session.descriptor();
        Self {
            session_id: session.id().clone(),
            final_state: session.state(),
            counters: session.counters(),
            remaining_batches: descriptor.pending_len(),
            completed_categories: descriptor.completed_categories().len(),
            records_exported: 0,
            files_written: 0,
            duration: Duration::ZERO,
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the delivered record and file totals
    pub fn with_output(mut self, records_exported: usize, files_written: usize) -> Self {
        self.records_exported = records_exported;
        self.files_written = files_written;
        self
    }

    /// Whether the queue was drained without dropping any batch
    pub fn is_successful(&self) -> bool {
        self.final_state == SessionState::Done && self.counters.dropped == 0
    }

    /// Whether the run stopped on a pause request
    pub fn interrupted(&self) -> bool {
        self.final_state == SessionState::Paused
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            session_id = %self.session_id,
            state = %self.final_state,
            completed = self.counters.completed,
            failed_attempts = self.counters.failed_attempts,
            dropped = self.counters.dropped,
            remaining = self.remaining_batches,
            records = self.records_exported,
            files = self.files_written,
            duration_secs = self.duration.as_secs(),
            "Export run finished"
        );

        if self.counters.dropped > 0 {
            tracing::warn!(
                dropped = self.counters.dropped,
                "Some batches were dropped after exhausting their retries"
            );
        }
        if self.counters.persistence_failures > 0 {
            tracing::warn!(
                failures = self.counters.persistence_failures,
                "Some descriptor writes failed; a restart may repeat delivered batches"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(state: SessionState, dropped: usize) -> ExportSummary {
        ExportSummary {
            session_id: SessionId::new("health-export").unwrap(),
            final_state: state,
            counters: ExportCounters {
                completed: 4,
                failed_attempts: dropped * 3,
                dropped,
                persistence_failures: 0,
            },
            remaining_batches: 0,
            completed_categories: 2,
            records_exported: 0,
            files_written: 0,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_is_successful() {
        assert!(summary(SessionState::Done, 0).is_successful());
        assert!(!summary(SessionState::Done, 1).is_successful());
        assert!(!summary(SessionState::Paused, 0).is_successful());
    }

    #[test]
    fn test_interrupted() {
        assert!(summary(SessionState::Paused, 0).interrupted());
        assert!(!summary(SessionState::Done, 0).interrupted());
    }

    #[test]
    fn test_builders() {
        let s = summary(SessionState::Done, 0)
            .with_duration(Duration::from_secs(120))
            .with_output(250, 3);

        assert_eq!(s.duration, Duration::from_secs(120));
        assert_eq!(s.records_exported, 250);
        assert_eq!(s.files_written, 3);
    }
}
