// Backfill - Resumable Health Metrics Bulk Export
// Copyright (c) 2025 Backfill Contributors
// Licensed under the MIT License

//! # Backfill - Resumable Health Metrics Bulk Export
//!
//! Backfill exports a multi-year backlog of per-category historical records
//! in bounded, calendar-year batches. Progress is persisted after every
//! batch, so an export survives restarts and resumes where it stopped.
//!
//! ## Overview
//!
//! - **Partitioning**: each category's history `[earliest, export end)` is
//!   split into calendar-year windows
//! - **Sequential pipeline**: fetch → process → deliver, one batch at a time
//! - **Bounded retries**: a failed batch moves to the back of the queue and
//!   is dropped once its retry budget is spent
//! - **Cooperative pause**: checked between batches, never mid-flight
//! - **Progress**: observable state and `[index/total]` snapshots
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Descriptor model, run loop, registry, persistence
//! - [`adapters`] - Data sources, processors and descriptor storage
//! - [`domain`] - Identifiers, time windows, records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use backfill::adapters::{Delivery, ExportedFile, FileStorage, JsonFileExporter, JsonLinesSource};
//! use backfill::core::session::{SessionRegistry, SessionSettings};
//! use backfill::core::state::StateManager;
//! use backfill::domain::{Category, SessionId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = FileStorage::new("./state").await?;
//!     let registry = SessionRegistry::new(
//!         Arc::new(JsonLinesSource::new("./data")),
//!         StateManager::new_with_storage(Arc::new(storage)),
//!         SessionSettings::default(),
//!     );
//!
//!     let session = registry
//!         .get_or_create_session(
//!             SessionId::new("health-export")?,
//!             &[Category::new("heart_rate")?, Category::new("step_count")?],
//!             JsonFileExporter::new("./export"),
//!             true,
//!             Arc::new(|_file: ExportedFile| Delivery::Accept),
//!         )
//!         .await?;
//!
//!     session.wait_until_idle().await;
//!     println!("{} batches completed", session.counters().completed);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Per-batch failures never surface to callers; they become queue updates
//! and counters. Errors returned from the API use
//! [`domain::BackfillError`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
