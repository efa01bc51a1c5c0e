//! Persistence store abstraction
//!
//! A descriptor store keeps one opaque blob per session id. Writes need only
//! be last-writer-wins per key; no cross-key transactions are required since
//! each session owns exactly one key.

use crate::domain::ids::SessionId;
use crate::domain::Result;
use async_trait::async_trait;

/// Durable key-value storage for serialized descriptors
#[async_trait]
pub trait DescriptorStorage: Send + Sync {
    /// Load the blob stored under `session_id`
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(bytes))` if found, `Ok(None)` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails for reasons other than "not found".
    async fn load(&self, session_id: &SessionId) -> Result<Option<Vec<u8>>>;

    /// Store `blob` under `session_id`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    async fn save(&self, session_id: &SessionId, blob: &[u8]) -> Result<()>;

    /// Remove the blob stored under `session_id`
    ///
    /// Deleting a missing key is not an error.
    async fn delete(&self, session_id: &SessionId) -> Result<()>;

    /// List every session id with a stored blob, sorted
    async fn list(&self) -> Result<Vec<SessionId>>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
