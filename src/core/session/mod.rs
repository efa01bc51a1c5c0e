//! Export sessions
//!
//! - [`session`] - The per-descriptor run loop and its control surface
//! - [`registry`] - Idempotent create-or-resume lookup by session id
//! - [`state`] - Lifecycle state, counters and progress snapshots

pub mod registry;
#[allow(clippy::module_inception)]
pub mod session;
pub mod state;

pub use registry::{ManagedSession, SessionRegistry};
pub use session::{default_fallback_epoch, Session, SessionSettings, DEFAULT_RETRY_BUDGET};
pub use state::{ExportCounters, ProgressSnapshot, SessionState};
