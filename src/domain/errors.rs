//! Domain error types
//!
//! This module defines the error hierarchy for Backfill. Per-batch failures
//! (query, process) are caught by the session run loop and turned into queue
//! mutations; only registry-level errors reach callers.

use thiserror::Error;

/// Main Backfill error type
///
/// This is the primary error type used throughout the crate.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A live session already exists under this id with a different processor type
    #[error(
        "Session '{session_id}' is already running with processor '{existing}', cannot reuse it with '{requested}'"
    )]
    ConflictingSessionType {
        /// The contested session id
        session_id: String,
        /// Processor type bound to the live session
        existing: String,
        /// Processor type the caller asked for
        requested: String,
    },

    /// Data source failed to return records for a batch
    #[error("Query failed: {0}")]
    Query(String),

    /// Processor failed on a batch of valid records
    #[error("Processing failed: {0}")]
    Process(String),

    /// Descriptor could not be read from or written to the persistence store
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl BackfillError {
    /// Whether the failure may succeed on a later attempt of the same batch
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackfillError::Query(_)
                | BackfillError::Process(_)
                | BackfillError::Persistence(_)
                | BackfillError::Io(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BackfillError {
    fn from(err: std::io::Error) -> Self {
        BackfillError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BackfillError {
    fn from(err: serde_json::Error) -> Self {
        BackfillError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BackfillError {
    fn from(err: toml::de::Error) -> Self {
        BackfillError::Configuration(format!("TOML parse error: {err}"))
    }
}
