//! Configuration management for Backfill.
//!
//! TOML-based configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `BACKFILL_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ExportConfig`] - Session id, categories, retry budget, fallback epoch
//! - [`SourceConfig`] - Directory of `<category>.jsonl` record files
//! - [`OutputConfig`] - Directory receiving exported batches
//! - [`StateConfig`] - Descriptor storage backend and location
//! - [`LoggingConfig`] - Rolling file logs
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! session_id = "health-export"
//! categories = ["heart_rate", "step_count"]
//! retry_budget = 3
//!
//! [source]
//! path = "${BACKFILL_DATA_DIR}"
//!
//! [output]
//! path = "./export"
//!
//! [state]
//! backend = "file"
//! path = "./state"
//! ```
//!
//! ```rust,no_run
//! use backfill::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("backfill.toml")?;
//! println!("Session: {}", config.export.session_id);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, BackfillConfig, ExportConfig, LoggingConfig, OutputConfig, SourceConfig,
    StateBackend, StateConfig,
};
