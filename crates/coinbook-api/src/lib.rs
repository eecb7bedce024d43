//! HTTP API server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::transactions: Main page, form, list, search, current prices
//! - routes::coins: Coin selector options and catalog refresh
//! - routes::settings: Configuration display

pub mod error;
pub mod routes;

use axum::{
    http::Method,
    routing::{delete, get, post},
    Router,
};
use coinbook_config::Config;
use coinbook_core::{resolve_price, CoinCatalog, CoreError, CoreResult, Submission, SubmitOutcome, TransactionManager};
use coinbook_market::{MarketRef, MarketResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

pub use error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<RwLock<TransactionManager>>,
    pub market: MarketRef,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, manager: TransactionManager, market: MarketRef) -> Self {
        Self {
            manager: Arc::new(RwLock::new(manager)),
            market,
            config,
        }
    }

    /// Apply the submitted form and run the create/update flow.
    ///
    /// The manager lock is released while the price lookup runs, so the
    /// cancel endpoint and read-only pages stay responsive. The lookup and
    /// its completion run in their own task: dropping this future (a client
    /// disconnect) never leaves the manager busy.
    pub async fn submit_form(&self, params: &HashMap<String, String>) -> CoreResult<SubmitOutcome> {
        let submission = {
            let mut manager = self.manager.write().await;
            routes::apply_form(&mut manager, params)?;
            manager.begin_submit()?
        };

        match submission {
            Submission::Updated { index } => Ok(SubmitOutcome::Updated { index }),
            Submission::NeedsPrice(request) => {
                let ticket = request.ticket;
                let coin = request.coin.clone();
                let state = self.clone();
                let completion = tokio::spawn(async move {
                    let price = resolve_price(
                        state.market.as_ref(),
                        &request.coin,
                        state.config.market_timeout(),
                        request.cancel,
                    )
                    .await;
                    state.manager.write().await.complete_create(request.ticket, price)
                });

                let index = match completion.await {
                    Ok(result) => result?,
                    Err(e) => {
                        log::error!("Price lookup task for {} failed: {}", coin, e);
                        let mut manager = self.manager.write().await;
                        manager.complete_create(ticket, Err(CoreError::PriceCancelled { coin }))?
                    }
                };
                Ok(SubmitOutcome::Created { index })
            }
        }
    }

    /// Fetch the coin catalog and install it. Returns the number of coins.
    /// On failure the catalog already installed stays in place.
    pub async fn refresh_catalog(&self) -> MarketResult<usize> {
        let catalog = CoinCatalog::fetch(self.market.as_ref()).await?;
        let count = catalog.len();
        self.manager.write().await.set_catalog(catalog);
        Ok(count)
    }
}

/// Load the coin catalog in the background
pub fn spawn_catalog_refresh(state: &AppState) -> tokio::task::JoinHandle<()> {
    let state = state.clone();
    tokio::spawn(async move {
        // Already logged by the fetch; POST /api/coins/refresh retries
        let _ = state.refresh_catalog().await;
    })
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::coins::{api_coins, api_coins_refresh, htmx_coin_options};
    use routes::settings::api_settings;
    use routes::transactions::{
        api_prices, api_state, api_transactions, htmx_lookup_cancel, htmx_prices, htmx_transaction_delete,
        htmx_transaction_draft, htmx_transaction_edit, htmx_transaction_form, htmx_transaction_submit,
        htmx_transactions_list, page_index,
    };

    // Read-only JSON may be fetched from other origins
    let cors = CorsLayer::new().allow_methods([Method::GET]).allow_origin(Any);

    let api = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/transactions", get(api_transactions))
        .route("/api/state", get(api_state))
        .route("/api/coins", get(api_coins))
        .route("/api/coins/refresh", post(api_coins_refresh))
        .route("/api/prices", get(api_prices))
        .route("/api/settings", get(api_settings))
        .layer(ServiceBuilder::new().layer(cors));

    Router::new()
        // HTMX page routes
        .route("/", get(page_index))
        // HTMX partial routes
        .route("/transactions", post(htmx_transaction_submit))
        .route("/transactions/list", get(htmx_transactions_list))
        .route("/transactions/form", get(htmx_transaction_form))
        .route("/transactions/draft", post(htmx_transaction_draft))
        .route("/transactions/prices", get(htmx_prices))
        .route("/transactions/lookup/cancel", post(htmx_lookup_cancel))
        .route("/transactions/:index/edit", post(htmx_transaction_edit))
        .route("/transactions/:index", delete(htmx_transaction_delete))
        .route("/coins/options", get(htmx_coin_options))
        .merge(api)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Coinbook</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ display: none; }}
        .htmx-request .htmx-indicator {{ display: inline-flex; }}
        .htmx-request.htmx-indicator {{ display: inline-flex; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
</body>
</html>"#,
        title, content
    )
}

/// Check if request is from HTMX (partial page update)
fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Wrap content for full page or HTMX partial
pub fn page_response(headers: &axum::http::HeaderMap, title: &str, inner_content: &str) -> String {
    if is_htmx_request(headers) {
        format!(r#"<main class='max-w-5xl mx-auto p-6'>{}</main>"#, inner_content)
    } else {
        base_html(
            title,
            &format!(
                r#"<header class='bg-white border-b'>
    <div class='max-w-5xl mx-auto px-6 py-4 flex items-center justify-between'>
        <h1 class='text-xl font-bold text-indigo-600'>Coinbook</h1>
        <span class='text-sm text-gray-500'>Crypto purchase tracker</span>
    </div>
</header>
<main class='max-w-5xl mx-auto p-6'>{}</main>"#,
                inner_content
            ),
        )
    }
}

/// Kind of a notification banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// Notification banner. `oob` swaps it into `#notice` from any response.
pub fn notice_html(kind: NoticeKind, message: &str, oob: bool) -> String {
    let (classes, icon) = match kind {
        NoticeKind::Success => ("bg-green-50 border-green-200 text-green-800", "✓"),
        NoticeKind::Info => ("bg-blue-50 border-blue-200 text-blue-800", "ℹ"),
        NoticeKind::Error => ("bg-red-50 border-red-200 text-red-800", "✗"),
    };
    format!(
        r#"<div id='notice' role='alert' {} class='mb-4 border rounded-lg p-4 flex items-center gap-2 {}'><span>{}</span><span class='font-medium'>{}</span></div>"#,
        if oob { "hx-swap-oob='true'" } else { "" },
        classes,
        icon,
        coinbook_utils::escape_html(message)
    )
}

/// Empty notification slot
pub fn empty_notice(oob: bool) -> String {
    format!(
        "<div id='notice' {}></div>",
        if oob { "hx-swap-oob='true'" } else { "" }
    )
}

/// Start the HTTP server
///
/// Binds the configured address, starts the background catalog fetch and
/// serves until Ctrl-C.
pub async fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    spawn_catalog_refresh(&state);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting Coinbook server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - / (Transactions)");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for handler tests

    use super::*;
    use async_trait::async_trait;
    use coinbook_core::MemoryStore;
    use coinbook_market::{Coin, MarketDataSource, MarketError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Market with a fixed catalog and prices
    pub struct FakeMarket {
        pub prices: HashMap<String, f64>,
        pub fail: AtomicBool,
        pub delay: Duration,
    }

    impl FakeMarket {
        pub fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }

        fn failing(&self) -> bool {
            self.fail.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeMarket {
        async fn coin_list(&self) -> MarketResult<Vec<Coin>> {
            if self.failing() {
                return Err(MarketError::ServerError(503, "down".to_string()));
            }
            Ok(vec![
                Coin::new("bitcoin", "Bitcoin"),
                Coin::new("bitcoin-cash", "Bitcoin Cash"),
                Coin::new("ethereum", "Ethereum"),
            ])
        }

        async fn prices(&self, ids: &[String]) -> MarketResult<HashMap<String, Option<f64>>> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing() {
                return Err(MarketError::ServerError(503, "down".to_string()));
            }
            Ok(ids.iter().map(|id| (id.clone(), self.prices.get(id).copied())).collect())
        }
    }

    pub const SEED: &str = r#"[
        {"date":"2024-01-01","amountPaid":"100","coinBought":"bitcoin","coinValue":42000},
        {"date":"2024-02-01","amountPaid":"30","coinBought":"ethereum","coinValue":2300}
    ]"#;

    pub fn fake_market(fail: bool, delay: Duration) -> Arc<FakeMarket> {
        Arc::new(FakeMarket {
            prices: [("bitcoin".to_string(), 65000.0), ("ethereum".to_string(), 3000.0)]
                .into_iter()
                .collect(),
            fail: AtomicBool::new(fail),
            delay,
        })
    }

    pub fn state_on(market: Arc<FakeMarket>) -> AppState {
        let mut config = Config::default();
        config.market.timeout_secs = 2;
        let manager = TransactionManager::new(Arc::new(MemoryStore::with_raw(SEED)));
        AppState::new(config, manager, market)
    }

    pub fn state_with(fail: bool) -> AppState {
        state_on(fake_market(fail, Duration::ZERO))
    }

    pub fn state() -> AppState {
        state_with(false)
    }

    pub fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    pub async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
