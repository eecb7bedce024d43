//! Coin catalog and price-quote clients
//!
//! A thin client over a CoinGecko-compatible REST API. Only the two
//! endpoints coinbook needs are covered: the coin list and simple prices.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

pub mod error;
pub mod types;
pub mod client;

pub use error::{MarketError, MarketResult};
pub use types::{Coin, SimplePrices, parse_coin_list, parse_simple_prices};
pub use client::CoinGeckoClient;

// ==================== Source Trait ====================

/// Market source reference type
pub type MarketRef = Arc<dyn MarketDataSource>;

/// Trait for market data sources
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the full coin catalog
    async fn coin_list(&self) -> MarketResult<Vec<Coin>>;

    /// Fetch quote-currency prices for several coins in one request.
    /// Coins the service has no price for map to `None`.
    async fn prices(&self, ids: &[String]) -> MarketResult<HashMap<String, Option<f64>>>;

    /// Fetch the price of a single coin
    async fn price(&self, id: &str) -> MarketResult<Option<f64>> {
        let ids = [id.to_string()];
        let prices = self.prices(&ids).await?;
        Ok(prices.get(id).copied().flatten())
    }
}
