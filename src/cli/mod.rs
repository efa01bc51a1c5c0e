//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Backfill using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Backfill - Resumable health metrics bulk export
#[derive(Parser, Debug)]
#[command(name = "backfill")]
#[command(version, about, long_about = None)]
#[command(author = "Backfill Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "backfill.toml", env = "BACKFILL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "BACKFILL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or resume the configured export session and run it
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show persisted sessions and remaining batches
    Status(commands::status::StatusArgs),

    /// Delete a session's persisted progress
    Reset(commands::reset::ResetArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["backfill", "export"]);
        assert_eq!(cli.config, "backfill.toml");
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["backfill", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_export_overrides() {
        let cli = Cli::parse_from([
            "backfill",
            "export",
            "--categories",
            "heart_rate,step_count",
            "--retry-budget",
            "5",
            "--prepare-only",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.categories.as_deref(), Some("heart_rate,step_count"));
        assert_eq!(args.retry_budget, Some(5));
        assert!(args.prepare_only);
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["backfill", "--log-level", "debug", "export"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["backfill", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["backfill", "status", "--session-id", "export-1"]);
        let Commands::Status(args) = cli.command else {
            panic!("expected status command");
        };
        assert_eq!(args.session_id.as_deref(), Some("export-1"));
    }

    #[test]
    fn test_cli_parse_reset() {
        let cli = Cli::parse_from(["backfill", "reset", "--yes"]);
        assert!(matches!(cli.command, Commands::Reset(ref args) if args.yes));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["backfill", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
