//! Core business logic for Backfill.
//!
//! # Modules
//!
//! - [`descriptor`] - Batch queue model and calendar-year partitioning
//! - [`session`] - Run loop, lifecycle state and the session registry
//! - [`state`] - Descriptor persistence through a storage backend
//! - [`export`] - Configured end-to-end export and its summary
//!
//! # Export Workflow
//!
//! 1. **Load or build**: read the descriptor, or partition each category's
//!    history into calendar-year batches
//! 2. **Run**: take the first eligible batch, fetch, process, deliver
//! 3. **Update**: complete the batch, or requeue it with one retry fewer
//! 4. **Checkpoint**: persist the descriptor after every mutation
//! 5. **Stop**: on pause between batches, or once the queue is empty
//!
//! # Example
//!
//! ```rust,no_run
//! use backfill::config::load_config;
//! use backfill::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("backfill.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator = ExportCoordinator::new(config, shutdown_rx).await?;
//! let summary = coordinator.execute_export().await?;
//!
//! println!("Completed: {}", summary.counters.completed);
//! println!("Dropped: {}", summary.counters.dropped);
//! # Ok(())
//! # }
//! ```

pub mod descriptor;
pub mod export;
pub mod session;
pub mod state;
