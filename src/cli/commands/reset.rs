//! Reset command implementation
//!
//! Deletes a session's persisted descriptor so the next export starts from a
//! freshly partitioned queue.

use crate::adapters::storage::create_state_storage;
use crate::config::load_config;
use crate::core::state::StateManager;
use crate::domain::SessionId;
use clap::Args;

/// Arguments for the reset command
#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Session to reset (defaults to export.session_id)
    #[arg(long)]
    pub session_id: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ResetArgs {
    /// Execute the reset command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let raw_id = self
            .session_id
            .clone()
            .unwrap_or_else(|| config.export.session_id.clone());
        let session_id = match SessionId::new(raw_id) {
            Ok(id) => id,
            Err(e) => {
                println!("❌ Invalid session id: {e}");
                return Ok(2);
            }
        };

        if !self.yes {
            print!("Delete all progress for session '{session_id}'? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Reset cancelled.");
                return Ok(0);
            }
        }

        let state_storage = match create_state_storage(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open descriptor storage");
                println!("   Error: {e}");
                return Ok(4); // Storage error exit code
            }
        };
        let state_manager = StateManager::new_with_storage(state_storage);

        match state_manager.delete_descriptor(&session_id).await {
            Ok(()) => {
                tracing::info!(session_id = %session_id, "Session state deleted");
                println!("✅ Session '{session_id}' reset");
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to delete session state");
                println!("   Error: {e}");
                Ok(4)
            }
        }
    }
}
