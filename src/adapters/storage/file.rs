//! Directory-backed descriptor storage
//!
//! Each session is stored as `<dir>/<session_id>.json`. Writes go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous descriptor intact.

use super::traits::DescriptorStorage;
use crate::domain::ids::SessionId;
use crate::domain::{BackfillError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// File-per-session [`DescriptorStorage`]
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) the storage directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            BackfillError::Persistence(format!(
                "Failed to create state directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the descriptor files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.{EXTENSION}", session_id.as_str()))
    }
}

#[async_trait]
impl DescriptorStorage for FileStorage {
    async fn load(&self, session_id: &SessionId) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(session_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackfillError::Persistence(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn save(&self, session_id: &SessionId, blob: &[u8]) -> Result<()> {
        let path = self.path_for(session_id);
        let tmp = self
            .dir
            .join(format!(".{}.{EXTENSION}.tmp", session_id.as_str()));

        tokio::fs::write(&tmp, blob).await.map_err(|e| {
            BackfillError::Persistence(format!("Failed to write {}: {e}", tmp.display()))
        })?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| {
            BackfillError::Persistence(format!(
                "Failed to move {} into place: {e}",
                path.display()
            ))
        })?;

        tracing::trace!(path = %path.display(), bytes = blob.len(), "Descriptor written");
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<()> {
        let path = self.path_for(session_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackfillError::Persistence(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match SessionId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Ignoring stray file");
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
