//! Descriptor storage factory
//!
//! This module creates the descriptor store selected in the configuration.

use super::file::FileStorage;
use super::memory::MemoryStorage;
use super::traits::DescriptorStorage;
use crate::config::schema::{BackfillConfig, StateBackend};
use crate::domain::Result;
use std::sync::Arc;

/// Create the descriptor storage named by `state.backend`
///
/// # Errors
///
/// Returns an error if the storage cannot be opened (e.g. the state
/// directory cannot be created).
pub async fn create_state_storage(
    config: &BackfillConfig,
) -> Result<Arc<dyn DescriptorStorage + Send + Sync>> {
    match config.state.backend {
        StateBackend::File => {
            tracing::info!(path = %config.state.path, "Creating file descriptor storage");
            let storage = FileStorage::new(&config.state.path).await?;
            Ok(Arc::new(storage) as Arc<dyn DescriptorStorage + Send + Sync>)
        }
        StateBackend::Memory => {
            tracing::warn!("Using in-memory descriptor storage; progress will not survive a restart");
            Ok(Arc::new(MemoryStorage::new()) as Arc<dyn DescriptorStorage + Send + Sync>)
        }
    }
}
