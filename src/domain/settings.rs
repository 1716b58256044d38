//! Runtime settings built from configuration.
//!
//! All keys are optional; missing ones take the defaults below. Values that
//! are present but unusable are rejected rather than silently replaced.

use crate::domain::error::LedgerError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_JSON_PATH: &str = "budget_data/ledger.json";
pub const DEFAULT_SQLITE_PATH: &str = "budget_data/ledger.sqlite";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: StorageBackend,
    pub data_path: PathBuf,
    pub pool_size: u32,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_path: PathBuf::from(DEFAULT_JSON_PATH),
            pool_size: 1,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, LedgerError> {
        let backend = parse_backend(config)?;
        let data_path = match config.get_string("storage", "path") {
            None => match backend {
                StorageBackend::Json => PathBuf::from(DEFAULT_JSON_PATH),
                StorageBackend::Sqlite => PathBuf::from(DEFAULT_SQLITE_PATH),
            },
            Some(_) => config.get_path("storage", "path").ok_or_else(|| {
                LedgerError::ConfigInvalid {
                    section: "storage".to_string(),
                    key: "path".to_string(),
                    reason: "path must not be empty".to_string(),
                }
            })?,
        };

        let pool_size = config.get_int("storage", "pool_size", 1);
        if !(1..=64).contains(&pool_size) {
            return Err(LedgerError::ConfigInvalid {
                section: "storage".to_string(),
                key: "pool_size".to_string(),
                reason: "pool_size must be between 1 and 64".to_string(),
            });
        }

        let log_level = parse_log_level(config)?;

        Ok(Self {
            backend,
            data_path,
            pool_size: pool_size as u32,
            log_level,
        })
    }
}

fn parse_backend(config: &dyn ConfigPort) -> Result<StorageBackend, LedgerError> {
    match config
        .get_string("storage", "backend")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("json") => Ok(StorageBackend::Json),
        Some("sqlite") => Ok(StorageBackend::Sqlite),
        Some(other) => Err(LedgerError::ConfigInvalid {
            section: "storage".to_string(),
            key: "backend".to_string(),
            reason: format!("unknown backend '{}' (expected json or sqlite)", other),
        }),
    }
}

fn parse_log_level(config: &dyn ConfigPort) -> Result<String, LedgerError> {
    match config.get_string("logging", "level") {
        None => Ok(DEFAULT_LOG_LEVEL.to_string()),
        Some(level) => {
            let level = level.trim().to_lowercase();
            if LOG_LEVELS.contains(&level.as_str()) {
                Ok(level)
            } else {
                Err(LedgerError::ConfigInvalid {
                    section: "logging".to_string(),
                    key: "level".to_string(),
                    reason: format!("unknown level '{}'", level),
                })
            }
        }
    }
}
