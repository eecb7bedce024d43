//! Configuration management for coinbook
//!
//! This module handles loading, validation, and management of
//! coinbook configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

/// Where transactions are kept
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `storage.path`
    File,
    /// Process memory only, lost on exit
    Memory,
}

impl Default for StorageBackend {
    fn default() -> Self {
        StorageBackend::File
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory holding the stored values
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Name of the key the transaction list is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            key: default_storage_key(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_storage_key() -> String {
    "transactions".to_string()
}

/// Market data (coin catalog and price quotes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Base URL of the CoinGecko-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Quote currency for prices
    #[serde(default = "default_vs_currency")]
    pub vs_currency: String,
    /// Upper bound for a single price lookup, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional demo API key
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            vs_currency: default_vs_currency(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_vs_currency() -> String {
    "usd".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Records per page for the transaction list
    #[serde(default = "default_records_per_page")]
    pub records_per_page: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            records_per_page: default_records_per_page(),
        }
    }
}

fn default_records_per_page() -> usize {
    50
}

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Market data settings
    #[serde(default)]
    pub market: MarketConfig,
    /// Pagination settings
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::Unreadable {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse { message: e.to_string() })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        let key = self.storage.key.trim();
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(ConfigError::InvalidValue {
                field: "storage.key".to_string(),
                reason: "Key must be a non-empty name without path separators".to_string(),
            });
        }

        if !(self.market.base_url.starts_with("http://") || self.market.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "market.base_url".to_string(),
                reason: "Base URL must start with http:// or https://".to_string(),
            });
        }

        if self.market.vs_currency.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "market.vs_currency".to_string(),
            });
        }

        if self.market.timeout_secs == 0 || self.market.timeout_secs > 300 {
            return Err(ConfigError::InvalidValue {
                field: "market.timeout_secs".to_string(),
                reason: "Timeout must be between 1 and 300 seconds".to_string(),
            });
        }

        if self.pagination.records_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "pagination.records_per_page".to_string(),
                reason: "Records per page must be greater than 0".to_string(),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Log level must be one of: {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Full path of the file backing the transaction list
    pub fn storage_file(&self) -> PathBuf {
        self.storage.path.join(format!("{}.json", self.storage.key.trim()))
    }

    /// Price lookup timeout as a Duration
    pub fn market_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.market.timeout_secs)
    }
}

// ==================== Tests ====================
