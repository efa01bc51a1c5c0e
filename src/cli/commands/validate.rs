//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Backfill configuration file.

use crate::config::load_config;
use crate::config::schema::StateBackend;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Session: {}", config.export.session_id);
        println!("  Categories: {:?}", config.export.categories);
        println!("  Retry Budget: {}", config.export.retry_budget);
        println!("  Fallback Epoch: {}", config.export.fallback_epoch);
        println!("  Auto Start: {}", config.export.auto_start);
        println!("  Source: {}", config.source.path);
        println!("  Output: {}", config.output.path);
        match config.state.backend {
            StateBackend::File => println!("  State: file ({})", config.state.path),
            StateBackend::Memory => println!("  State: memory (not persisted)"),
        }
        println!();
        Ok(0)
    }
}
