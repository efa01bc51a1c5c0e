//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "backfill.toml")]
    pub output: String,

    /// Include comments explaining every setting
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Backfill configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your categories and paths", self.output);
                println!("  2. Put one <category>.jsonl file per category in source.path");
                println!("  3. Validate configuration: backfill validate-config");
                println!("  4. Run export: backfill export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    pub(crate) fn generate_minimal_config() -> String {
        r#"# Backfill Configuration File

[application]
log_level = "info"

[export]
session_id = "health-export"
categories = ["heart_rate", "step_count"]
retry_budget = 3
fallback_epoch = "2014-09-01T00:00:00Z"
auto_start = true

[source]
path = "./data"

[output]
path = "./export"

[state]
backend = "file"
path = "./state"

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    pub(crate) fn generate_config_with_examples() -> String {
        r#"# Backfill Configuration File
#
# Resumable bulk export of historical health records.
#
# Values may reference environment variables as ${VAR_NAME}. Any setting can
# also be overridden with BACKFILL_<SECTION>_<KEY>, for example
# BACKFILL_EXPORT_RETRY_BUDGET=5.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Export Session
# ============================================================================
[export]
# Session id; progress is stored under this key and resumed on the next run
session_id = "health-export"

# Categories to export, in processing order
categories = [
    "heart_rate",
    "step_count",
]

# Attempts per batch before it is dropped (1-100)
retry_budget = 3

# History start used when a category's earliest record is unknown
fallback_epoch = "2014-09-01T00:00:00Z"

# Run the export immediately; false only prepares and persists the batches
auto_start = true

# ============================================================================
# Record Source
# ============================================================================
[source]
# Directory with one <category>.jsonl file per category
path = "./data"

# ============================================================================
# Output
# ============================================================================
[output]
# Batches are written to <path>/<category>/<first>_<last>.json
path = "./export"

# ============================================================================
# Descriptor Persistence
# ============================================================================
[state]
# Backend: "file" (one <session_id>.json per session) or "memory"
backend = "file"

# Directory for the file backend
path = "./state"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Directory for log files
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}
