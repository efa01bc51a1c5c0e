//! Configuration schema types
//!
//! This module defines the configuration structure for Backfill.

use crate::core::session::{default_fallback_epoch, SessionSettings, DEFAULT_RETRY_BUDGET};
use crate::domain::ids::{Category, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest accepted retry budget
pub const MAX_RETRY_BUDGET: u32 = 100;

/// Main Backfill configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Export session settings
    pub export: ExportConfig,

    /// Record source
    pub source: SourceConfig,

    /// Processor output
    pub output: OutputConfig,

    /// Descriptor persistence
    #[serde(default)]
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BackfillConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.source.validate()?;
        self.output.validate()?;
        self.state.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Session id as a typed identifier
    ///
    /// # Errors
    ///
    /// Returns an error if `export.session_id` is not a valid id.
    pub fn session_id(&self) -> Result<SessionId, String> {
        SessionId::new(self.export.session_id.as_str())
    }

    /// Categories as typed identifiers, in configured order
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid category.
    pub fn categories(&self) -> Result<Vec<Category>, String> {
        self.export
            .categories
            .iter()
            .map(|c| Category::new(c.as_str()))
            .collect()
    }

    /// Settings handed to the session registry
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            retry_budget: self.export.retry_budget,
            fallback_epoch: self.export.fallback_epoch,
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Export session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Session id; the descriptor is stored under this key
    pub session_id: String,

    /// Categories to export, in processing order
    pub categories: Vec<String>,

    /// Attempts per batch before it is dropped
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Partitioning start for categories whose earliest record is unknown
    #[serde(default = "default_fallback_epoch")]
    pub fallback_epoch: DateTime<Utc>,

    /// Start the run as soon as the session is created
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        SessionId::new(self.session_id.as_str())
            .map_err(|e| format!("Invalid export.session_id: {e}"))?;

        if self.categories.is_empty() {
            return Err("export.categories cannot be empty".to_string());
        }
        for (i, category) in self.categories.iter().enumerate() {
            Category::new(category.as_str())
                .map_err(|e| format!("Invalid export.categories entry: {e}"))?;
            if self.categories[..i].contains(category) {
                return Err(format!("Duplicate export.categories entry '{category}'"));
            }
        }

        if self.retry_budget == 0 || self.retry_budget > MAX_RETRY_BUDGET {
            return Err(format!(
                "export.retry_budget must be between 1 and {MAX_RETRY_BUDGET}, got {}",
                self.retry_budget
            ));
        }

        Ok(())
    }
}

/// Record source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding one `<category>.jsonl` file per category
    pub path: String,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("source.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Processor output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving exported batch files
    pub path: String,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("output.path cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Descriptor storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    /// One JSON file per session in `state.path`
    #[default]
    File,
    /// Process memory; nothing survives a restart
    Memory,
}

/// State management configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StateBackend,

    /// Directory for the file backend
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            path: default_state_path(),
        }
    }
}

impl StateConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StateBackend::File && self.path.trim().is_empty() {
            return Err("state.path is required for the file backend".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path is required when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_retry_budget() -> u32 {
    DEFAULT_RETRY_BUDGET
}

fn default_true() -> bool {
    true
}

fn default_state_path() -> String {
    "./state".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
