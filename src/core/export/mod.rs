//! Export orchestration and reporting
//!
//! - [`coordinator`] - Runs the configured session end to end
//! - [`summary`] - Report of a finished or paused run

pub mod coordinator;
pub mod summary;

pub use coordinator::ExportCoordinator;
pub use summary::ExportSummary;
