//! Export command implementation
//!
//! This module implements the `export` command: create or resume the
//! configured session and run it until the queue is drained or a shutdown
//! signal pauses it.

use crate::config::load_config;
use crate::core::export::{ExportCoordinator, ExportSummary};
use crate::core::session::SessionState;
use clap::Args;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Override the session id
    #[arg(long)]
    pub session_id: Option<String>,

    /// Override the categories to export (comma-separated)
    #[arg(long)]
    pub categories: Option<String>,

    /// Override the retry budget
    #[arg(long)]
    pub retry_budget: Option<u32>,

    /// Only build and persist the batch queue, do not run it
    #[arg(long)]
    pub prepare_only: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        if let Some(session_id) = &self.session_id {
            tracing::info!(session_id = %session_id, "Overriding session id from CLI");
            config.export.session_id = session_id.clone();
        }
        if let Some(categories) = &self.categories {
            let categories: Vec<String> = categories
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::info!(categories = ?categories, "Overriding categories from CLI");
            config.export.categories = categories;
        }
        if let Some(budget) = self.retry_budget {
            tracing::info!(retry_budget = budget, "Overriding retry budget from CLI");
            config.export.retry_budget = budget;
        }
        if self.prepare_only {
            config.export.auto_start = false;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(2); // Configuration error exit code
        }

        println!("Export Configuration:");
        println!("  Session: {}", config.export.session_id);
        println!("  Categories: {:?}", config.export.categories);
        println!("  Retry budget: {}", config.export.retry_budget);
        println!("  Source: {}", config.source.path);
        println!("  Output: {}", config.output.path);
        println!();

        let coordinator = match ExportCoordinator::new(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Storage error exit code
            }
        };

        println!("🚀 Starting export...");
        println!();

        let summary = match coordinator.execute_export().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        print_summary(&summary);
        Ok(exit_code(&summary))
    }
}

fn print_summary(summary: &ExportSummary) {
    println!();
    println!("📊 Export Summary:");
    println!("  Session: {}", summary.session_id);
    println!("  State: {}", summary.final_state);
    println!("  Batches completed: {}", summary.counters.completed);
    println!("  Failed attempts: {}", summary.counters.failed_attempts);
    println!("  Batches dropped: {}", summary.counters.dropped);
    println!("  Batches remaining: {}", summary.remaining_batches);
    println!("  Records exported: {}", summary.records_exported);
    println!("  Files written: {}", summary.files_written);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();
}

fn exit_code(summary: &ExportSummary) -> i32 {
    if summary.interrupted() {
        println!("⚠️  Export paused gracefully. Progress saved.");
        println!("   Run the same command to resume.");
        tracing::info!("Export interrupted by user signal");
        130 // SIGINT exit code (standard Unix convention)
    } else if summary.final_state == SessionState::Scheduled {
        println!("✅ Batch queue prepared: {} batches", summary.remaining_batches);
        0
    } else if summary.is_successful() {
        println!("✅ Export completed successfully!");
        0
    } else {
        println!("⚠️  Export completed with dropped batches");
        1 // Partial success
    }
}
