//! Error types for coinbook-market

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited, retry after {retry_after} s")]
    RateLimited { retry_after: u64 },

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("HTTP error ({0}): {1}")]
    HttpError(u16, String),

    #[error("Request error: {0}")]
    RequestError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl MarketError {
    /// Whether the same request could succeed later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MarketError::RateLimited { .. } | MarketError::ServerError(..) | MarketError::RequestError(_)
        )
    }
}

/// Result type with MarketError
pub type MarketResult<T> = Result<T, MarketError>;
