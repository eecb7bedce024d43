//! Coin catalog endpoints

use crate::error::ApiError;
use crate::routes::transactions::api::render_coin_options;
use crate::AppState;
use axum::extract::Query;
use axum::response::Html;
use std::collections::HashMap;

/// Catalog entries returned by the JSON search at most
const COIN_SEARCH_LIMIT: usize = 100;

fn search_term(params: &HashMap<String, String>) -> &str {
    params
        .get("coinSearch")
        .or_else(|| params.get("q"))
        .map(|s| s.as_str())
        .unwrap_or("")
}

/// Coin selector options filtered by name (HTML fragment)
pub async fn htmx_coin_options(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> Html<String> {
    let manager = state.manager.read().await;
    Html(render_coin_options(&manager, search_term(&params)))
}

/// Search the catalog by name (JSON API)
pub async fn api_coins(state: axum::extract::State<AppState>, params: Query<HashMap<String, String>>) -> String {
    let manager = state.manager.read().await;
    let catalog = manager.catalog();
    let coins = catalog.search(search_term(&params), COIN_SEARCH_LIMIT);
    serde_json::to_string(&serde_json::json!({
        "loaded": catalog.is_loaded(),
        "total_count": catalog.len(),
        "coins": coins,
    }))
    .unwrap_or_default()
}

/// Re-fetch the catalog (JSON API). A failed fetch keeps the current
/// catalog and answers with the market error.
pub async fn api_coins_refresh(state: axum::extract::State<AppState>) -> Result<String, ApiError> {
    let count = state.refresh_catalog().await?;
    Ok(serde_json::to_string(&serde_json::json!({
        "success": true,
        "count": count,
    }))
    .unwrap_or_default())
}
