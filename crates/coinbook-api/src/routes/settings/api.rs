//! Settings API endpoints - JSON API

use crate::AppState;

/// Active configuration, with the API key masked
pub async fn api_settings(state: axum::extract::State<AppState>) -> String {
    let mut config = state.config.clone();
    if config.market.api_key.is_some() {
        config.market.api_key = Some("********".to_string());
    }
    serde_json::to_string(&config).unwrap_or_default()
}
