//! State manager for descriptor persistence
//!
//! This module provides the StateManager for loading and saving descriptors
//! through a [`DescriptorStorage`] backend. Descriptors are stored as JSON.

use crate::adapters::storage::DescriptorStorage;
use crate::core::descriptor::Descriptor;
use crate::domain::ids::SessionId;
use crate::domain::{BackfillError, Result};
use std::sync::Arc;

/// State manager for descriptor persistence
///
/// Owns the encoding of descriptors; the storage backend only sees opaque
/// blobs keyed by session id.
#[derive(Clone)]
pub struct StateManager {
    /// State storage backend
    storage: Arc<dyn DescriptorStorage + Send + Sync>,
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("backend", &self.storage.backend_name())
            .finish()
    }
}

impl StateManager {
    /// Create a new StateManager with a storage backend
    ///
    /// # Arguments
    ///
    /// * `storage` - Descriptor storage implementation
    pub fn new_with_storage(storage: Arc<dyn DescriptorStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Load a descriptor
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(Descriptor))` if found, `Ok(None)` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, the blob cannot be decoded, or the
    /// decoded descriptor violates the queue invariants.
    pub async fn load_descriptor(&self, session_id: &SessionId) -> Result<Option<Descriptor>> {
        let Some(blob) = self.storage.load(session_id).await? else {
            return Ok(None);
        };

        let descriptor = decode(&blob)?;
        if &descriptor.session_id != session_id {
            return Err(BackfillError::Persistence(format!(
                "Descriptor stored under '{session_id}' belongs to '{}'",
                descriptor.session_id
            )));
        }
        descriptor.validate().map_err(|e| {
            BackfillError::Persistence(format!("Corrupt descriptor for '{session_id}': {e}"))
        })?;

        Ok(Some(descriptor))
    }

    /// Save a descriptor, replacing the stored one
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails.
    pub async fn save_descriptor(&self, descriptor: &Descriptor) -> Result<()> {
        let blob = encode(descriptor)?;
        self.storage.save(&descriptor.session_id, &blob).await
    }

    /// Checkpoint the descriptor after a queue mutation
    ///
    /// This is `save_descriptor` with checkpoint logging.
    pub async fn checkpoint(&self, descriptor: &Descriptor) -> Result<()> {
        tracing::debug!(
            session_id = %descriptor.session_id,
            pending = descriptor.pending_len(),
            completed_categories = descriptor.completed_categories().len(),
            "Checkpointing descriptor"
        );

        self.save_descriptor(descriptor).await
    }

    /// Delete the stored descriptor; a missing one is not an error
    pub async fn delete_descriptor(&self, session_id: &SessionId) -> Result<()> {
        self.storage.delete(session_id).await
    }

    /// Load every stored descriptor
    ///
    /// Undecodable entries are logged and skipped.
    pub async fn get_all_descriptors(&self) -> Result<Vec<Descriptor>> {
        let mut descriptors = Vec::new();
        for session_id in self.storage.list().await? {
            match self.load_descriptor(&session_id).await {
                Ok(Some(descriptor)) => descriptors.push(descriptor),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Skipping unreadable descriptor");
                }
            }
        }
        Ok(descriptors)
    }

    /// Ids of every stored descriptor
    pub async fn list_sessions(&self) -> Result<Vec<SessionId>> {
        self.storage.list().await
    }
}

fn encode(descriptor: &Descriptor) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(descriptor).map_err(|e| {
        BackfillError::Serialization(format!(
            "Failed to encode descriptor '{}': {e}",
            descriptor.session_id
        ))
    })
}

fn decode(blob: &[u8]) -> Result<Descriptor> {
    serde_json::from_slice(blob)
        .map_err(|e| BackfillError::Persistence(format!("Failed to decode descriptor: {e}")))
}
