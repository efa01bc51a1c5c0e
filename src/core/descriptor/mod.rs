//! Partitioned work model
//!
//! - [`batch`] - the unit of fetch and process work
//! - [`partition`] - calendar-year partitioning of a category's history
//! - [`model`] - the persisted [`Descriptor`] and its batch queue

pub mod batch;
pub mod model;
pub mod partition;

pub use batch::{Batch, BatchKey};
pub use model::{Descriptor, FailureOutcome};
pub use partition::{partition_category, partition_windows};
