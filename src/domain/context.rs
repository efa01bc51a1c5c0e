//! Error context extension trait
//!
//! Adds `.context()` and `.with_context()` to any result whose error converts
//! into [`BackfillError`], keeping the crate's error type intact instead of
//! erasing it the way `anyhow::Context` does.
//!
//! ```rust
//! use backfill::domain::Result;
//! use backfill::domain::context::ResultExt;
//!
//! fn read_categories(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))
//! }
//! ```

use crate::domain::errors::BackfillError;
use crate::domain::result::Result;

/// Context helpers for fallible library code
pub trait ResultExt<T> {
    /// Prefix the error message with `context`
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Like [`ResultExt::context`], but only builds the message on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BackfillError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| wrap(e.into(), context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

/// Keep the variant where callers branch on it, fold the rest into `Other`
fn wrap(error: BackfillError, context: impl std::fmt::Display) -> BackfillError {
    match error {
        BackfillError::Configuration(msg) => {
            BackfillError::Configuration(format!("{context}: {msg}"))
        }
        BackfillError::Persistence(msg) => BackfillError::Persistence(format!("{context}: {msg}")),
        other => BackfillError::Other(format!("{context}: {other}")),
    }
}
