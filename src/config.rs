use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};
use crate::messages::MessageId;

pub const DEFAULT_SIZE_ERROR_MESSAGE: &str = "File is too large to upload";
pub const DEFAULT_VALID_ERROR_MESSAGE: &str = "File type is not supported";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: Option<String>,
    pub request_timeout_secs: u64,
    pub request_interval_ms: u64,
    pub log_level: String,
    /// Report a lone failure in a multi-file batch directly instead of as a group
    pub collapse_lone_failure: bool,
    /// Automatic retries the CLI performs; the orchestrator itself never caps retries
    pub max_retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub messages: HashMap<MessageId, String>,
    pub size_error_message: String,
    pub valid_error_message: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_secs: 120,
            request_interval_ms: 0,
            log_level: "info".to_string(),
            collapse_lone_failure: true,
            max_retry_attempts: 3,
            retry_delay_ms: 1000,
            messages: HashMap::new(),
            size_error_message: DEFAULT_SIZE_ERROR_MESSAGE.to_string(),
            valid_error_message: DEFAULT_VALID_ERROR_MESSAGE.to_string(),
        }
    }
}

pub fn get_config_path() -> AppResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| AppError::Config("Could not find config directory".to_string()))?
        .join("Batch Uploader");

    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("config.json"))
}

pub fn load_config() -> AppResult<Config> {
    load_config_from(&get_config_path()?)
}

/// Load from `path`, writing defaults there if nothing exists yet.
pub fn load_config_from(path: &Path) -> AppResult<Config> {
    if path.exists() {
        let config_str = fs::read_to_string(path)?;
        let config = parse_config(&config_str).unwrap_or_else(|e| {
            log::warn!(
                "Failed to parse config file {}: {}. Using defaults.",
                path.display(),
                e
            );
            Config::default()
        });

        validate_config(&config)?;
        Ok(config)
    } else {
        let default_config = Config::default();
        save_config_to(path, &default_config)?;
        Ok(default_config)
    }
}

pub fn parse_config(config_str: &str) -> AppResult<Config> {
    Ok(serde_json::from_str(config_str)?)
}

/// Map a configured level name to a filter, defaulting to `Info`.
pub fn log_level_filter(level: &str) -> log::LevelFilter {
    level.parse().unwrap_or(log::LevelFilter::Info)
}

pub fn save_config(config: &Config) -> AppResult<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> AppResult<()> {
    validate_config(config)?;

    if path.exists() {
        let backup_path = path.with_extension("json.bak");
        if let Err(e) = fs::copy(path, &backup_path) {
            log::warn!("Failed to create config backup: {}", e);
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config_str = serde_json::to_string_pretty(config)?;
    fs::write(path, config_str)?;

    log::info!("Configuration saved to {}", path.display());
    Ok(())
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    if let Some(endpoint) = &config.endpoint {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(AppError::invalid_endpoint(endpoint));
        }
    }

    if config.request_timeout_secs == 0 || config.request_timeout_secs > 3600 {
        return Err(AppError::validation(
            "request_timeout_secs",
            "Must be between 1 and 3600",
        ));
    }

    if config.max_retry_attempts > 10 {
        return Err(AppError::validation("max_retry_attempts", "Must be 10 or fewer"));
    }

    if config.size_error_message.trim().is_empty() {
        return Err(AppError::validation("size_error_message", "Must not be empty"));
    }

    if config.valid_error_message.trim().is_empty() {
        return Err(AppError::validation("valid_error_message", "Must not be empty"));
    }

    let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
    if !valid_log_levels.contains(&config.log_level.as_str()) {
        return Err(AppError::validation("log_level", "Must be a valid log level"));
    }

    Ok(())
}
