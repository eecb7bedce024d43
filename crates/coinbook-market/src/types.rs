//! Wire types for the coin list and simple price endpoints

use crate::error::{MarketError, MarketResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry. The service sends more fields (symbol, platforms);
/// only `id` and `name` are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Stable identifier used for price queries (e.g. "bitcoin")
    pub id: String,
    /// Display label (e.g. "Bitcoin")
    pub name: String,
}

impl Coin {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// `{"bitcoin": {"usd": 65000.0}, ...}`. A quote may be `null` for coins
/// the service lists but has no price for.
pub type SimplePrices = HashMap<String, HashMap<String, Option<f64>>>;

/// Parse a `/coins/list` response body
pub fn parse_coin_list(body: &str) -> MarketResult<Vec<Coin>> {
    serde_json::from_str::<Vec<Coin>>(body)
        .map_err(|e| MarketError::DeserializationError(format!("Failed to parse coin list: {}", e)))
}

/// Parse a `/simple/price` response body and pick out the quote currency.
/// Every requested id appears in the result, `None` when the service
/// returned nothing for it.
pub fn parse_simple_prices(
    body: &str,
    ids: &[String],
    vs_currency: &str,
) -> MarketResult<HashMap<String, Option<f64>>> {
    let raw: SimplePrices = serde_json::from_str(body)
        .map_err(|e| MarketError::DeserializationError(format!("Failed to parse prices: {}", e)))?;

    Ok(ids
        .iter()
        .map(|id| {
            let price = raw.get(id).and_then(|quotes| quotes.get(vs_currency)).copied().flatten();
            (id.clone(), price)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coin_list_ignores_extra_fields() {
        let body = r#"[
            {"id": "bitcoin", "symbol": "btc", "name": "Bitcoin"},
            {"id": "ethereum", "symbol": "eth", "name": "Ethereum", "platforms": {}}
        ]"#;
        let coins = parse_coin_list(body).unwrap();
        assert_eq!(coins, vec![Coin::new("bitcoin", "Bitcoin"), Coin::new("ethereum", "Ethereum")]);
    }

    #[test]
    fn test_parse_coin_list_rejects_garbage() {
        let err = parse_coin_list("<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, MarketError::DeserializationError(_)));
    }

    #[test]
    fn test_parse_simple_prices() {
        let ids = vec!["bitcoin".to_string(), "nocoin".to_string()];
        let prices = parse_simple_prices(r#"{"bitcoin":{"usd":65000}}"#, &ids, "usd").unwrap();
        assert_eq!(prices.get("bitcoin"), Some(&Some(65000.0)));
        assert_eq!(prices.get("nocoin"), Some(&None));
    }

    #[test]
    fn test_parse_simple_prices_null_quote() {
        let ids = vec!["bitcoin".to_string(), "ethereum".to_string()];
        let body = r#"{"bitcoin":{"usd":null},"ethereum":{"usd":3000}}"#;
        let prices = parse_simple_prices(body, &ids, "usd").unwrap();
        assert_eq!(prices.get("bitcoin"), Some(&None));
        assert_eq!(prices.get("ethereum"), Some(&Some(3000.0)));
    }

    #[test]
    fn test_parse_simple_prices_other_currency_missing() {
        let ids = vec!["bitcoin".to_string()];
        let prices = parse_simple_prices(r#"{"bitcoin":{"usd":65000}}"#, &ids, "eur").unwrap();
        assert_eq!(prices.get("bitcoin"), Some(&None));
    }

    #[test]
    fn test_parse_simple_prices_empty_object() {
        let ids = vec!["bitcoin".to_string()];
        let prices = parse_simple_prices("{}", &ids, "usd").unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["bitcoin"], None);
    }
}
