//! Coin catalog held for the coin selector

use coinbook_market::{Coin, MarketDataSource, MarketResult};

/// Coins offered in the selector, refreshed once per session
#[derive(Debug, Clone, Default)]
pub struct CoinCatalog {
    coins: Vec<Coin>,
    loaded: bool,
}

impl CoinCatalog {
    pub fn new(coins: Vec<Coin>) -> Self {
        Self { coins, loaded: true }
    }

    /// Fetch the catalog. Failures are logged and returned; nothing is
    /// retried.
    pub async fn fetch(source: &dyn MarketDataSource) -> MarketResult<Self> {
        match source.coin_list().await {
            Ok(coins) => {
                log::info!("Coin catalog loaded: {} coins", coins.len());
                Ok(Self::new(coins))
            }
            Err(e) => {
                log::error!("Failed to fetch coin catalog: {}", e);
                Err(e)
            }
        }
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Whether a fetch has succeeded
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: &str) -> Option<&Coin> {
        self.coins.iter().find(|c| c.id == id)
    }

    /// Display name for a coin id, falling back to the id itself
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|c| c.name.as_str()).unwrap_or(id)
    }

    /// Coins whose name contains `term`, ignoring case, at most `limit`
    pub fn search(&self, term: &str, limit: usize) -> Vec<&Coin> {
        let needle = term.trim().to_lowercase();
        self.coins
            .iter()
            .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}
