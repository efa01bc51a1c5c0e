//! Domain models and types for Backfill.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`SessionId`], [`Category`])
//! - **Time windows** ([`TimeWindow`]) bounding each batch
//! - **Records** ([`Record`]) returned by data sources
//! - **Error types** ([`BackfillError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a category can never be passed
//! where a session id is expected:
//!
//! ```rust
//! use backfill::domain::{Category, SessionId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session_id = SessionId::new("export-1")?;
//! let category = Category::new("heart_rate")?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod errors;
pub mod ids;
pub mod record;
pub mod result;
pub mod window;

pub use errors::BackfillError;
pub use ids::{Category, SessionId};
pub use record::Record;
pub use result::Result;
pub use window::TimeWindow;
