//! Coin routes - Selector options, catalog search and refresh

pub mod api;

pub use api::{api_coins, api_coins_refresh, htmx_coin_options};
