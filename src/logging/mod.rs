//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - Console output with a `RUST_LOG`-aware filter
//! - Optional JSON file logging with daily or hourly rotation
//! - Run-loop macros carrying the session, category and window fields
//!
//! # Example
//!
//! ```no_run
//! use backfill::logging::init_logging;
//! use backfill::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(session_id = "health-export", "Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a batch attempt
///
/// # Example
///
/// ```no_run
/// use backfill::core::descriptor::Batch;
/// use backfill::domain::{Category, SessionId, TimeWindow};
/// use backfill::log_batch_start;
///
/// let session_id = SessionId::new("health-export").unwrap();
/// let batch = Batch::new(
///     Category::new("heart_rate").unwrap(),
///     TimeWindow::calendar_year(2021).unwrap(),
///     3,
/// );
/// log_batch_start!(&session_id, &batch, 1, 4);
/// ```
#[macro_export]
macro_rules! log_batch_start {
    ($session_id:expr, $batch:expr, $index:expr, $total:expr) => {
        tracing::info!(
            session_id = %$session_id,
            category = %$batch.category,
            window = %$batch.window.label(),
            remaining_retries = $batch.remaining_retries,
            index = $index,
            total = $total,
            "Processing batch"
        );
    };
}

/// Log a failed attempt that was requeued
#[macro_export]
macro_rules! log_retry_attempt {
    ($session_id:expr, $batch:expr, $remaining:expr, $reason:expr) => {
        tracing::warn!(
            session_id = %$session_id,
            category = %$batch.category,
            window = %$batch.window.label(),
            remaining_retries = $remaining,
            reason = %$reason,
            "Batch failed, requeued for retry"
        );
    };
}

/// Log a batch dropped after spending its retry budget
#[macro_export]
macro_rules! log_batch_dropped {
    ($session_id:expr, $batch:expr, $reason:expr) => {
        tracing::warn!(
            session_id = %$session_id,
            category = %$batch.category,
            window = %$batch.window.label(),
            reason = %$reason,
            "Retries exhausted, batch dropped"
        );
    };
}
