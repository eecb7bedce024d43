//! Error types for coinbook-core
//!
//! Every failure a user can run into while recording purchases maps to a
//! `CoreError`, with a stable code, a severity, and suggestions for the UI.

use thiserror::Error;
use serde::{Deserialize, Serialize};
use coinbook_market::MarketError;
use std::io;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Row index does not exist
    TransactionNotFound,
    /// Draft failed validation
    ValidationError,
    /// Storage could not be written
    StorageError,
    /// Price service failed
    PriceLookupFailed,
    /// Price service did not answer in time
    PriceLookupTimeout,
    /// Price lookup was cancelled
    PriceLookupCancelled,
    /// A price lookup is already running
    Busy,
    /// No lookup matches the given ticket
    NoPendingLookup,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorCode::StorageError => write!(f, "STORAGE_ERROR"),
            ErrorCode::PriceLookupFailed => write!(f, "PRICE_LOOKUP_FAILED"),
            ErrorCode::PriceLookupTimeout => write!(f, "PRICE_LOOKUP_TIMEOUT"),
            ErrorCode::PriceLookupCancelled => write!(f, "PRICE_LOOKUP_CANCELLED"),
            ErrorCode::Busy => write!(f, "BUSY"),
            ErrorCode::NoPendingLookup => write!(f, "NO_PENDING_LOOKUP"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    /// Informational
    Info,
    /// Warning - the operation was refused, nothing changed
    Warning,
    /// Error - the operation failed
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// Main error type for coinbook-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Transaction not found at position {index}")]
    TransactionNotFound { index: usize },

    #[error("Please fill in all fields correctly.")]
    ValidationError { fields: Vec<String> },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Could not fetch the price of {coin}: {source}")]
    PriceLookup {
        coin: String,
        #[source]
        source: MarketError,
    },

    #[error("Price lookup for {coin} timed out after {seconds} s")]
    PriceTimeout { coin: String, seconds: u64 },

    #[error("Price lookup for {coin} was cancelled")]
    PriceCancelled { coin: String },

    #[error("A price lookup is already in progress")]
    Busy,

    #[error("No price lookup is pending")]
    NoPendingLookup,
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            CoreError::ValidationError { .. } => ErrorCode::ValidationError,
            CoreError::Storage { .. } => ErrorCode::StorageError,
            CoreError::PriceLookup { .. } => ErrorCode::PriceLookupFailed,
            CoreError::PriceTimeout { .. } => ErrorCode::PriceLookupTimeout,
            CoreError::PriceCancelled { .. } => ErrorCode::PriceLookupCancelled,
            CoreError::Busy => ErrorCode::Busy,
            CoreError::NoPendingLookup => ErrorCode::NoPendingLookup,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
            CoreError::ValidationError { .. } => ErrorSeverity::Warning,
            CoreError::Storage { .. } => ErrorSeverity::Error,
            CoreError::PriceLookup { .. } => ErrorSeverity::Error,
            CoreError::PriceTimeout { .. } => ErrorSeverity::Error,
            CoreError::PriceCancelled { .. } => ErrorSeverity::Info,
            CoreError::Busy => ErrorSeverity::Warning,
            CoreError::NoPendingLookup => ErrorSeverity::Info,
        }
    }

    /// Whether this error ends a create attempt with the draft kept
    pub fn is_price_failure(&self) -> bool {
        matches!(
            self,
            CoreError::PriceLookup { .. } | CoreError::PriceTimeout { .. } | CoreError::PriceCancelled { .. }
        )
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self {
            CoreError::TransactionNotFound { .. } => {
                details = details.with_suggestion(
                    "The list may have changed. Reload it and try again.".to_string()
                );
            }
            CoreError::ValidationError { fields } => {
                details = details.with_detail(serde_json::json!({ "fields": fields }));
                details = details.with_suggestion(
                    "Date, amount paid and coin are required.".to_string()
                );
            }
            CoreError::Storage { message } => {
                details = details.with_detail(serde_json::json!({ "storage_message": message }));
                details = details.with_suggestion(
                    "Check that the storage directory exists and is writable.".to_string()
                );
            }
            CoreError::PriceLookup { source, .. } => {
                details = details.with_detail(serde_json::json!({ "market_message": source.to_string() }));
                details = details.with_suggestion(
                    "Error fetching the coin price. Please try again.".to_string()
                );
            }
            CoreError::PriceTimeout { .. } => {
                details = details.with_suggestion(
                    "The price service is slow right now. Please try again.".to_string()
                );
            }
            CoreError::Busy => {
                details = details.with_suggestion(
                    "Wait for the current price lookup to finish or cancel it.".to_string()
                );
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::Storage { message: error.to_string() }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Storage { message: error.to_string() }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::TransactionNotFound.to_string(), "TRANSACTION_NOT_FOUND");
        assert_eq!(ErrorCode::PriceLookupTimeout.to_string(), "PRICE_LOOKUP_TIMEOUT");
        assert_eq!(ErrorCode::Busy.to_string(), "BUSY");
    }

    #[test]
    fn test_error_severity_display() {
        assert_eq!(ErrorSeverity::Info.to_string(), "info");
        assert_eq!(ErrorSeverity::Warning.to_string(), "warning");
        assert_eq!(ErrorSeverity::Error.to_string(), "error");
    }

    #[test]
    fn test_core_error_code_and_severity() {
        let error = CoreError::TransactionNotFound { index: 3 };
        assert_eq!(error.code(), ErrorCode::TransactionNotFound);
        assert_eq!(error.severity(), ErrorSeverity::Info);
        assert!(error.to_string().contains('3'));

        let error = CoreError::Storage { message: "disk full".to_string() };
        assert_eq!(error.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_timeout_is_distinct_from_lookup_failure() {
        let timeout = CoreError::PriceTimeout { coin: "bitcoin".to_string(), seconds: 10 };
        let failed = CoreError::PriceLookup {
            coin: "bitcoin".to_string(),
            source: MarketError::ServerError(502, "bad gateway".to_string()),
        };
        assert_ne!(timeout.code(), failed.code());
        assert!(timeout.is_price_failure());
        assert!(failed.is_price_failure());
        assert!(!CoreError::Busy.is_price_failure());
    }

    #[test]
    fn test_validation_details_lists_fields() {
        let error = CoreError::ValidationError {
            fields: vec!["date".to_string(), "coinBought".to_string()],
        };
        let details = error.to_details();
        assert_eq!(details.code, ErrorCode::ValidationError);
        assert_eq!(details.message, "Please fill in all fields correctly.");
        assert_eq!(details.details.unwrap()["fields"][1], "coinBought");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let error: CoreError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(error.code(), ErrorCode::StorageError);
    }

    #[test]
    fn test_error_details_builder() {
        let details = ErrorDetails::new(ErrorCode::Busy, "busy".to_string())
            .with_detail(serde_json::json!({"coin": "bitcoin"}))
            .with_suggestion("Wait".to_string());
        assert!(details.details.is_some());
        assert_eq!(details.suggestions.len(), 1);
        assert!(details.to_string().starts_with("[BUSY] busy"));
    }
}
