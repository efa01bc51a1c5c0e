//! Export coordinator - main orchestrator for the export process
//!
//! Wires the configured data source, descriptor storage and JSON file
//! exporter into a [`SessionRegistry`], runs the configured session and
//! turns a shutdown signal into a cooperative pause.

use crate::adapters::processor::{Delivery, ExportedFile, JsonFileExporter};
use crate::adapters::source::JsonLinesSource;
use crate::adapters::storage::create_state_storage;
use crate::config::BackfillConfig;
use crate::core::export::summary::ExportSummary;
use crate::core::session::SessionRegistry;
use crate::core::state::StateManager;
use crate::domain::{BackfillError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Export coordinator
pub struct ExportCoordinator {
    config: BackfillConfig,
    registry: SessionRegistry,
    shutdown_signal: watch::Receiver<bool>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor storage cannot be opened.
    pub async fn new(config: BackfillConfig, shutdown_signal: watch::Receiver<bool>) -> Result<Self> {
        let storage = create_state_storage(&config).await?;
        let state_manager = StateManager::new_with_storage(storage);
        let source = Arc::new(JsonLinesSource::new(&config.source.path));
        let registry = SessionRegistry::new(source, state_manager, config.session_settings());

        Ok(Self {
            config,
            registry,
            shutdown_signal,
        })
    }

    /// Registry holding the export session
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Execute the export
    ///
    /// Creates or resumes the configured session and, when
    /// `export.auto_start` is set, runs it until the queue is drained or a
    /// shutdown is signalled. Without `auto_start` the descriptor is only
    /// prepared and persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured ids are invalid or the stored
    /// descriptor cannot be read.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start_time = Instant::now();

        let session_id = self.config.session_id().map_err(BackfillError::Validation)?;
        let categories = self.config.categories().map_err(BackfillError::Validation)?;

        let records = Arc::new(AtomicUsize::new(0));
        let files = Arc::new(AtomicUsize::new(0));
        let handler = {
            let records = Arc::clone(&records);
            let files = Arc::clone(&files);
            move |exported: ExportedFile| {
                records.fetch_add(exported.record_count, Ordering::Relaxed);
                if let Some(path) = &exported.path {
                    files.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        category = %exported.category,
                        path = %path.display(),
                        records = exported.record_count,
                        "Batch file written"
                    );
                }
                Delivery::Accept
            }
        };

        let session = self
            .registry
            .get_or_create_session(
                session_id,
                &categories,
                JsonFileExporter::new(&self.config.output.path),
                self.config.export.auto_start,
                Arc::new(handler),
            )
            .await?;

        if self.config.export.auto_start {
            let mut shutdown = self.shutdown_signal.clone();
            tokio::select! {
                _ = session.wait_until_idle() => {}
                _ = shutdown_requested(&mut shutdown) => {
                    tracing::info!(session_id = %session.id(), "Shutdown requested, pausing after the current batch");
                    session.pause();
                    session.wait_until_idle().await;
                }
            }
        } else {
            tracing::info!(
                session_id = %session.id(),
                pending = session.pending_batches().len(),
                "auto_start disabled, descriptor prepared without running"
            );
        }

        let summary = ExportSummary::from_session(&session)
            .with_output(records.load(Ordering::Relaxed), files.load(Ordering::Relaxed))
            .with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}

/// Resolves once the signal turns true; never resolves if the sender is gone
async fn shutdown_requested(signal: &mut watch::Receiver<bool>) {
    let requested = signal.wait_for(|stop| *stop).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}
