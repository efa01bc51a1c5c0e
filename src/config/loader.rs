//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{BackfillConfig, StateBackend};
use crate::domain::errors::BackfillError;
use crate::domain::result::Result;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::fs;
use std::path::Path;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "BACKFILL";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BackfillConfig
/// 4. Applies environment variable overrides (BACKFILL_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns a configuration error if the file is missing or unreadable, a
/// referenced variable is unset, the TOML is malformed, an override cannot
/// be parsed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use backfill::config::loader::load_config;
///
/// let config = load_config("backfill.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BackfillConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BackfillError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BackfillError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    parse_config(&contents)
}

/// Parse configuration text with the same steps as [`load_config`]
pub fn parse_config(contents: &str) -> Result<BackfillConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: BackfillConfig = toml::from_str(&contents)
        .map_err(|e| BackfillError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        BackfillError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error naming every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| BackfillError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BackfillError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_key(section: &str, key: &str) -> String {
    format!("{ENV_PREFIX}_{section}_{key}")
}

fn env_override(section: &str, key: &str) -> Option<String> {
    std::env::var(env_key(section, key)).ok()
}

fn parse_override<T: std::str::FromStr>(section: &str, key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        BackfillError::Configuration(format!(
            "Invalid value '{raw}' for {}: {e}",
            env_key(section, key)
        ))
    })
}

/// Applies environment variable overrides using the BACKFILL_* prefix
///
/// Environment variables follow the pattern `BACKFILL_<SECTION>_<KEY>`,
/// for example `BACKFILL_EXPORT_RETRY_BUDGET` or `BACKFILL_STATE_PATH`.
/// List values (`BACKFILL_EXPORT_CATEGORIES`) are comma-separated.
fn apply_env_overrides(config: &mut BackfillConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env_override("APPLICATION", "LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Export overrides
    if let Some(val) = env_override("EXPORT", "SESSION_ID") {
        config.export.session_id = val;
    }
    if let Some(val) = env_override("EXPORT", "CATEGORIES") {
        config.export.categories = val
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(val) = env_override("EXPORT", "RETRY_BUDGET") {
        config.export.retry_budget = parse_override("EXPORT", "RETRY_BUDGET", &val)?;
    }
    if let Some(val) = env_override("EXPORT", "FALLBACK_EPOCH") {
        config.export.fallback_epoch =
            parse_override::<DateTime<Utc>>("EXPORT", "FALLBACK_EPOCH", &val)?;
    }
    if let Some(val) = env_override("EXPORT", "AUTO_START") {
        config.export.auto_start = parse_override("EXPORT", "AUTO_START", &val)?;
    }

    // Source and output overrides
    if let Some(val) = env_override("SOURCE", "PATH") {
        config.source.path = val;
    }
    if let Some(val) = env_override("OUTPUT", "PATH") {
        config.output.path = val;
    }

    // State overrides
    if let Some(val) = env_override("STATE", "BACKEND") {
        config.state.backend = match val.trim().to_ascii_lowercase().as_str() {
            "file" => StateBackend::File,
            "memory" => StateBackend::Memory,
            other => {
                return Err(BackfillError::Configuration(format!(
                    "Invalid value '{other}' for {}: expected file or memory",
                    env_key("STATE", "BACKEND")
                )))
            }
        };
    }
    if let Some(val) = env_override("STATE", "PATH") {
        config.state.path = val;
    }

    // Logging overrides
    if let Some(val) = env_override("LOGGING", "LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("LOGGING", "LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_override("LOGGING", "LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
