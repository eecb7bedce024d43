//! CoinGecko HTTP client

use crate::error::{MarketError, MarketResult};
use crate::types::{parse_coin_list, parse_simple_prices, Coin};
use crate::MarketDataSource;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::Client as HttpClient;
use std::collections::HashMap;

/// Client for the public CoinGecko API
pub struct CoinGeckoClient {
    http_client: HttpClient,
    base_url: String,
    vs_currency: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.coingecko.com/api/v3";

    /// Create a client against the public API, quoting in USD
    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL.to_string(), "usd".to_string())
    }

    /// Create a client with a custom base URL and quote currency
    pub fn with_base_url(base_url: String, vs_currency: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            vs_currency: vs_currency.to_lowercase(),
            api_key: None,
        }
    }

    /// Send the demo API key header with every request
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    fn create_headers(&self) -> MarketResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(ref key) = self.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| MarketError::RequestError(format!("Invalid API key header: {}", e)))?;
            headers.insert("x-cg-demo-api-key", value);
        }

        Ok(headers)
    }

    /// Map a non-success response to a MarketError
    async fn handle_error_response(response: reqwest::Response) -> MarketError {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());
        let body_text = response.text().await.unwrap_or_default();

        match status {
            400 => MarketError::BadRequest(body_text),
            401 | 403 => MarketError::Unauthorized(body_text),
            404 => MarketError::NotFound(body_text),
            429 => {
                let retry_after = retry_after.unwrap_or(60);
                log::warn!("Rate limited by market API, retry after {} s", retry_after);
                MarketError::RateLimited { retry_after }
            }
            500..=599 => {
                log::warn!("Market API server error {}: {}", status, body_text);
                MarketError::ServerError(status, body_text)
            }
            _ => MarketError::HttpError(status, body_text),
        }
    }

    /// GET a path and return the body text of a successful response
    async fn get_text(&self, path: &str, query: &[(&str, &str)]) -> MarketResult<String> {
        let url = format!("{}{}", self.base_url, path);
        let headers = self.create_headers()?;

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::RequestError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::handle_error_response(response).await);
        }

        response
            .text()
            .await
            .map_err(|e| MarketError::RequestError(format!("Failed to read response: {}", e)))
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    /// GET /coins/list
    async fn coin_list(&self) -> MarketResult<Vec<Coin>> {
        let body = self.get_text("/coins/list", &[]).await?;
        let coins = parse_coin_list(&body)?;
        log::debug!("Fetched {} coins from catalog", coins.len());
        Ok(coins)
    }

    /// GET /simple/price?ids=a,b&vs_currencies=usd
    async fn prices(&self, ids: &[String]) -> MarketResult<HashMap<String, Option<f64>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join(",");
        let body = self
            .get_text(
                "/simple/price",
                &[("ids", joined.as_str()), ("vs_currencies", self.vs_currency.as_str())],
            )
            .await?;

        parse_simple_prices(&body, ids, &self.vs_currency)
    }
}
