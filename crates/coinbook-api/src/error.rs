//! Error types for coinbook-api

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coinbook_core::{CoreError, ErrorCode};
use coinbook_market::MarketError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Market data unavailable: {0}")]
    Market(#[from] MarketError),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => match e.code() {
                ErrorCode::TransactionNotFound => StatusCode::NOT_FOUND,
                ErrorCode::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::PriceLookupFailed => StatusCode::BAD_GATEWAY,
                ErrorCode::PriceLookupTimeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorCode::PriceLookupCancelled | ErrorCode::Busy | ErrorCode::NoPendingLookup => {
                    StatusCode::CONFLICT
                }
            },
            ApiError::Market(MarketError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Market(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// JSON body for this error
    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Core(e) => serde_json::json!({
                "success": false,
                "error": e.to_details(),
                "severity": e.severity(),
            }),
            ApiError::Market(e) => serde_json::json!({
                "success": false,
                "error": { "message": e.to_string(), "transient": e.is_transient() },
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        let headers = [(axum::http::header::CONTENT_TYPE, "application/json")];
        (status, headers, self.body().to_string()).into_response()
    }
}
