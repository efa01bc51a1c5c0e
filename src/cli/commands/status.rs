//! Status command implementation
//!
//! This module implements the `status` command for displaying persisted
//! sessions and their remaining batches.

use crate::adapters::storage::create_state_storage;
use crate::config::load_config;
use crate::core::descriptor::Descriptor;
use crate::core::state::StateManager;
use clap::Args;
use std::collections::BTreeMap;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only show this session
    #[arg(long)]
    pub session_id: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking export status");

        println!("📊 Export Status");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let state_storage = match create_state_storage(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open descriptor storage");
                println!("   Error: {e}");
                return Ok(4); // Storage error exit code
            }
        };

        let state_manager = StateManager::new_with_storage(state_storage);

        let descriptors = match state_manager.get_all_descriptors().await {
            Ok(d) => d,
            Err(e) => {
                println!("❌ Failed to load descriptors");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        let descriptors: Vec<&Descriptor> = descriptors
            .iter()
            .filter(|d| {
                self.session_id
                    .as_deref()
                    .map_or(true, |id| d.session_id.as_str() == id)
            })
            .collect();

        if descriptors.is_empty() {
            println!("No export sessions found.");
            println!("Run 'backfill export' to start exporting data.");
            return Ok(0);
        }

        for descriptor in descriptors {
            print_descriptor(descriptor);
        }
        Ok(0)
    }
}

/// Pending batch count per category, in queue order of first appearance
pub(crate) fn pending_by_category(descriptor: &Descriptor) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for batch in descriptor.pending_batches() {
        let name = batch.category.as_str();
        if !counts.contains_key(name) {
            order.push(name.to_string());
        }
        *counts.entry(name.to_string()).or_default() += 1;
    }
    order
        .into_iter()
        .map(|name| {
            let count = counts.get(&name).copied().unwrap_or_default();
            (name, count)
        })
        .collect()
}

fn print_descriptor(descriptor: &Descriptor) {
    let status = if descriptor.is_finished() {
        "✅ Completed"
    } else {
        "🔄 Pending"
    };

    println!("Session: {} ({status})", descriptor.session_id);
    println!(
        "  Export end: {}",
        descriptor.export_end.format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Pending batches: {}", descriptor.pending_len());
    println!();

    let pending = pending_by_category(descriptor);
    if !pending.is_empty() {
        println!("  {:<30} {:<10}", "Category", "Batches");
        println!("  {}", "-".repeat(40));
        for (category, count) in pending {
            println!("  {category:<30} {count:<10}");
        }
        println!();
    }

    if !descriptor.completed_categories().is_empty() {
        let completed: Vec<&str> = descriptor
            .completed_categories()
            .iter()
            .map(|c| c.as_str())
            .collect();
        println!("  Completed categories: {}", completed.join(", "));
        println!();
    }
}
