//! Error types for coinbook-config

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Stable codes reported for configuration failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigErrorCode {
    FileNotFound,
    Unreadable,
    ParseError,
    MissingField,
    InvalidValue,
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ConfigErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ConfigErrorCode::Unreadable => "UNREADABLE",
            ConfigErrorCode::ParseError => "PARSE_ERROR",
            ConfigErrorCode::MissingField => "MISSING_FIELD",
            ConfigErrorCode::InvalidValue => "INVALID_VALUE",
        };
        f.write_str(code)
    }
}

/// What the binary prints when the config cannot be used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigErrorDetails {
    pub code: ConfigErrorCode,
    pub message: String,
    /// Dotted key, e.g. `market.timeout_secs`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

impl ConfigErrorDetails {
    pub fn new(code: ConfigErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            field: None,
            hints: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

impl std::fmt::Display for ConfigErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        for hint in &self.hints {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// Whether coinbook can still start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigErrorSeverity {
    /// Startup continues with the built-in defaults
    Warning,
    /// Startup aborts
    Error,
}

impl std::fmt::Display for ConfigErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigErrorSeverity::Warning => f.write_str("warning"),
            ConfigErrorSeverity::Error => f.write_str("error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {path} does not exist")]
    FileNotFound { path: String },

    #[error("Cannot read config file {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("Config file is not valid YAML: {message}")]
    Parse { message: String },

    #[error("{field} must be set")]
    MissingField { field: String },

    #[error("{field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Extra guidance for the settings users most often get wrong
fn field_hint(field: &str) -> Option<&'static str> {
    match field {
        "server.port" => Some("Coinbook listens on 8090 unless told otherwise."),
        "storage.key" => Some("The key becomes the data file name, e.g. 'transactions' stores to transactions.json."),
        "market.base_url" => Some("The public CoinGecko API lives at https://api.coingecko.com/api/v3."),
        "market.vs_currency" => Some("Prices are quoted in this currency; CoinGecko accepts ids such as usd or eur."),
        "market.timeout_secs" => Some("The submit button waits this long for a price; 10 is a good start."),
        _ => None,
    }
}

impl ConfigError {
    pub fn code(&self) -> ConfigErrorCode {
        match self {
            ConfigError::FileNotFound { .. } => ConfigErrorCode::FileNotFound,
            ConfigError::Unreadable { .. } => ConfigErrorCode::Unreadable,
            ConfigError::Parse { .. } => ConfigErrorCode::ParseError,
            ConfigError::MissingField { .. } => ConfigErrorCode::MissingField,
            ConfigError::InvalidValue { .. } => ConfigErrorCode::InvalidValue,
        }
    }

    pub fn severity(&self) -> ConfigErrorSeverity {
        match self {
            // main falls back to defaults
            ConfigError::FileNotFound { .. } => ConfigErrorSeverity::Warning,
            _ => ConfigErrorSeverity::Error,
        }
    }

    /// The field this error is about, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingField { field } | ConfigError::InvalidValue { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    pub fn to_details(&self) -> ConfigErrorDetails {
        let details = ConfigErrorDetails::new(self.code(), self.to_string());

        let details = match self {
            ConfigError::FileNotFound { .. } => details
                .with_hint("Pass --config <path> to use another file.")
                .with_hint("coinbook --print-default-config > config.yaml writes a starting point."),
            ConfigError::Unreadable { .. } => {
                details.with_hint("Check the file permissions of the config file.")
            }
            ConfigError::Parse { .. } => {
                details.with_hint("Compare against the output of --print-default-config.")
            }
            ConfigError::MissingField { .. } | ConfigError::InvalidValue { .. } => details,
        };

        match self.field() {
            Some(field) => {
                let details = details.with_field(field);
                match field_hint(field) {
                    Some(hint) => details.with_hint(hint),
                    None => details,
                }
            }
            None => details,
        }
    }
}

/// Result type with ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;
