//! Result type alias for Backfill
//!
//! This module provides a convenient Result type alias that uses
//! BackfillError as the error type.

use super::errors::BackfillError;

/// Result type alias for Backfill operations
///
/// # Examples
///
/// ```
/// use backfill::domain::result::Result;
/// use backfill::domain::errors::BackfillError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(BackfillError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, BackfillError>;
