//! In-memory descriptor storage
//!
//! Keeps blobs in a map for the lifetime of the process. Used by tests and
//! for throwaway sessions.

use super::traits::DescriptorStorage;
use crate::domain::ids::SessionId;
use crate::domain::{BackfillError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Map-backed [`DescriptorStorage`]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<BTreeMap<SessionId, Vec<u8>>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make subsequent `save` calls fail, simulating an unavailable store
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DescriptorStorage for MemoryStorage {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(session_id).cloned())
    }

    async fn save(&self, session_id: &SessionId, blob: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BackfillError::Persistence(format!(
                "memory store rejected write for '{session_id}'"
            )));
        }
        self.blobs
            .write()
            .await
            .insert(session_id.clone(), blob.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        self.blobs.write().await.remove(session_id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        Ok(self.blobs.read().await.keys().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
