//! Transactions API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_transactions: Transactions matching a search term (JSON)
//! - api_state: Draft, errors, mode and busy flag (JSON)
//! - api_prices: Current prices of held coins (JSON)
//! - htmx_transactions_list: Transaction list (HTML fragment)
//! - htmx_transaction_form: Create/edit form (HTML fragment)
//! - htmx_transaction_draft: Incremental field validation (HTML fragment)
//! - htmx_transaction_submit: Create or update from the form (HTMX)
//! - htmx_transaction_edit: Load a row into the form (HTMX)
//! - htmx_transaction_delete: Delete a row (HTMX)
//! - htmx_lookup_cancel: Cancel the pending price lookup (HTMX)
//! - htmx_prices: Current prices panel (HTML fragment)

use crate::error::ApiError;
use crate::routes::{apply_form, parse_form};
use crate::{empty_notice, notice_html, AppState, NoticeKind};
use axum::extract::{Path, Query};
use axum::response::{Html, IntoResponse, Response};
use coinbook_core::{CoinCatalog, CoreError, ErrorSeverity, FormField, Mode, SubmitOutcome, TransactionManager};
use coinbook_utils::{escape_html, format_amount, format_number, format_price};
use std::collections::HashMap;

/// Fired after the list changed; the list and price panels reload on it
const TRANSACTIONS_CHANGED: [(&str, &str); 1] = [("hx-trigger", "transactions-changed")];

/// Fired when the edited row changes; only the list reloads on it
const MODE_CHANGED: [(&str, &str); 1] = [("hx-trigger", "mode-changed")];

/// Largest page the list renders
const MAX_PAGE_SIZE: usize = 500;

/// Most coins offered in the selector at once
const COIN_OPTION_LIMIT: usize = 200;

// ==================== Rendering ====================

fn notice_kind(error: &CoreError) -> NoticeKind {
    match error.severity() {
        ErrorSeverity::Info => NoticeKind::Info,
        ErrorSeverity::Warning | ErrorSeverity::Error => NoticeKind::Error,
    }
}

fn log_error(action: &str, error: &CoreError) {
    match error.severity() {
        ErrorSeverity::Error => log::error!("{} failed: {}", action, error),
        ErrorSeverity::Warning => log::warn!("{} refused: {}", action, error),
        ErrorSeverity::Info => log::info!("{}: {}", action, error),
    }
}

/// `<option>` list for the coin selector. The draft's coin is always
/// present and selected, even when outside the filtered range.
pub(crate) fn render_coin_options(manager: &TransactionManager, term: &str) -> String {
    let catalog = manager.catalog();
    let selected = manager.draft().coin_bought.as_str();
    let matches = catalog.search(term, COIN_OPTION_LIMIT);

    let mut html = if catalog.is_loaded() {
        String::from("<option value=''>Select a coin</option>")
    } else {
        String::from("<option value=''>Coin list not loaded</option>")
    };

    if !selected.is_empty() && !matches.iter().any(|c| c.id == selected) {
        html.push_str(&format!(
            "<option value='{}' selected>{}</option>",
            escape_html(selected),
            escape_html(catalog.display_name(selected))
        ));
    }
    for coin in matches {
        html.push_str(&format!(
            "<option value='{}'{}>{}</option>",
            escape_html(&coin.id),
            if coin.id == selected { " selected" } else { "" },
            escape_html(&coin.name)
        ));
    }
    html
}

fn field_error(manager: &TransactionManager, field: FormField) -> String {
    escape_html(manager.errors().get(field).unwrap_or(""))
}

/// The create/edit form
pub(crate) fn render_form(manager: &TransactionManager) -> String {
    let draft = manager.draft();
    let mode = manager.mode();
    let title = match mode {
        Mode::Creating => "New transaction".to_string(),
        Mode::Editing { index } => format!("Editing transaction #{}", index + 1),
    };
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d");

    // The stored price is only editable on existing records
    let coin_value_input = if mode.is_editing() {
        format!(
            r#"<div>
                <label class='block text-sm font-medium text-gray-700 mb-1'>Coin value</label>
                <input type='text' inputmode='decimal' name='coinValue' value='{}' class='w-full px-3 py-2 border rounded-lg'
                    hx-post='/transactions/draft' hx-trigger='input changed delay:300ms' hx-target='#error-coinValue' hx-swap='innerHTML'>
                <p id='error-coinValue' class='text-sm text-red-600 mt-1'>{}</p>
            </div>"#,
            escape_html(&draft.get(FormField::CoinValue)),
            field_error(manager, FormField::CoinValue)
        )
    } else {
        String::new()
    };

    format!(
        r#"<form id='transaction-form' hx-post='/transactions' hx-target='this' hx-swap='outerHTML' class='bg-white rounded-xl shadow-sm p-6'>
        <h3 class='text-lg font-semibold mb-4'>{}</h3>
        <div class='grid grid-cols-1 md:grid-cols-2 gap-4'>
            <div>
                <label class='block text-sm font-medium text-gray-700 mb-1'>Date</label>
                <input type='date' name='date' value='{}' max='{}' class='w-full px-3 py-2 border rounded-lg'
                    hx-post='/transactions/draft' hx-trigger='change' hx-target='#error-date' hx-swap='innerHTML'>
                <p id='error-date' class='text-sm text-red-600 mt-1'>{}</p>
            </div>
            <div>
                <label class='block text-sm font-medium text-gray-700 mb-1'>Amount paid</label>
                <input type='number' step='any' min='0' name='amountPaid' value='{}' class='w-full px-3 py-2 border rounded-lg'
                    hx-post='/transactions/draft' hx-trigger='input changed delay:300ms' hx-target='#error-amountPaid' hx-swap='innerHTML'>
                <p id='error-amountPaid' class='text-sm text-red-600 mt-1'>{}</p>
            </div>
            <div class='md:col-span-2'>
                <label class='block text-sm font-medium text-gray-700 mb-1'>Coin bought</label>
                <input type='search' name='coinSearch' placeholder='Search coins...' class='w-full px-3 py-2 border rounded-lg mb-2'
                    hx-get='/coins/options' hx-trigger='input changed delay:300ms, search' hx-target='#coin-options'>
                <select id='coin-options' name='coinBought' class='w-full px-3 py-2 border rounded-lg bg-white'
                    hx-post='/transactions/draft' hx-trigger='change' hx-target='#error-coinBought' hx-swap='innerHTML'>{}</select>
                <p id='error-coinBought' class='text-sm text-red-600 mt-1'>{}</p>
            </div>
            {}
        </div>
        <div class='flex items-center gap-3 mt-6'>
            <button type='submit' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>{}</button>
            <span class='htmx-indicator items-center gap-2 text-sm text-gray-500'>
                Fetching price...
                <button type='button' hx-post='/transactions/lookup/cancel' hx-swap='none' class='px-2 py-1 border rounded hover:bg-gray-50'>Cancel</button>
            </span>
        </div>
    </form>"#,
        title,
        escape_html(&draft.date),
        today,
        field_error(manager, FormField::Date),
        escape_html(&draft.amount_paid),
        field_error(manager, FormField::AmountPaid),
        render_coin_options(manager, ""),
        field_error(manager, FormField::CoinBought),
        coin_value_input,
        mode.submit_label()
    )
}

/// One page of the (filtered) transaction list
pub(crate) fn render_list(manager: &TransactionManager, query: &str, offset: usize, limit: usize) -> String {
    if manager.is_empty() {
        return "<div class='bg-white rounded-xl shadow-sm p-8 text-center text-gray-500'>No transactions yet. Add your first purchase above.</div>".to_string();
    }

    let results = manager.search(query);
    let total_count = results.len();
    if total_count == 0 {
        return format!(
            "<div class='bg-white rounded-xl shadow-sm p-8 text-center text-gray-500'>No transactions match \"{}\".</div>",
            escape_html(query)
        );
    }

    let catalog = manager.catalog();
    let editing = match manager.mode() {
        Mode::Editing { index } => Some(index),
        Mode::Creating => None,
    };

    let rows: Vec<String> = results
        .iter()
        .skip(offset)
        .take(limit)
        .map(|item| {
            let tx = &item.transaction;
            let row_class = if editing == Some(item.index) { "bg-indigo-50" } else { "hover:bg-gray-50" };
            let quantity = tx.quantity().map(|q| format_number(q, 8)).unwrap_or_else(|| "-".to_string());
            format!(
                r#"<tr class='border-b {}'>
                <td class='px-4 py-3 text-gray-500'>{}</td>
                <td class='px-4 py-3'>{}</td>
                <td class='px-4 py-3 text-right font-mono'>{}</td>
                <td class='px-4 py-3'>{}</td>
                <td class='px-4 py-3 text-right font-mono'>{}</td>
                <td class='px-4 py-3 text-right font-mono'>{}</td>
                <td class='px-4 py-3 text-right whitespace-nowrap'>
                    <button hx-post='/transactions/{}/edit' hx-target='#transaction-form' hx-swap='outerHTML' class='text-indigo-600 hover:underline'>Edit</button>
                    <button hx-delete='/transactions/{}' hx-target='#transaction-form' hx-swap='outerHTML' hx-confirm='Delete this transaction?' class='ml-3 text-red-600 hover:underline'>Delete</button>
                </td>
            </tr>"#,
                row_class,
                item.index + 1,
                escape_html(&tx.date),
                escape_html(&format_amount(&tx.amount_paid)),
                escape_html(catalog.display_name(&tx.coin_bought)),
                format_price(tx.coin_value),
                quantity,
                item.index,
                item.index
            )
        })
        .collect();

    let current_page = (offset / limit).saturating_add(1);
    let total_pages = total_count.div_ceil(limit);
    let encoded_query = urlencoding::encode(query);
    let prev_button = if offset > 0 {
        format!(
            "<button hx-get='/transactions/list?q={}&offset={}&limit={}' hx-target='#transactions-content' class='px-3 py-1 border rounded hover:bg-gray-50'>Previous</button>",
            encoded_query,
            offset.saturating_sub(limit),
            limit
        )
    } else {
        String::new()
    };
    let next_offset = offset.saturating_add(limit);
    let next_button = if next_offset < total_count {
        format!(
            "<button hx-get='/transactions/list?q={}&offset={}&limit={}' hx-target='#transactions-content' class='px-3 py-1 border rounded hover:bg-gray-50'>Next</button>",
            encoded_query,
            next_offset,
            limit
        )
    } else {
        String::new()
    };

    format!(
        r#"<div class='bg-white rounded-xl shadow-sm overflow-hidden'>
        <table class='w-full text-sm'>
            <thead class='bg-gray-50 text-gray-600'>
                <tr>
                    <th class='px-4 py-3 text-left'>#</th>
                    <th class='px-4 py-3 text-left'>Date</th>
                    <th class='px-4 py-3 text-right'>Amount paid</th>
                    <th class='px-4 py-3 text-left'>Coin</th>
                    <th class='px-4 py-3 text-right'>Coin value</th>
                    <th class='px-4 py-3 text-right'>Quantity</th>
                    <th class='px-4 py-3'></th>
                </tr>
            </thead>
            <tbody>{}</tbody>
        </table>
        <div class='flex items-center justify-between px-4 py-3 text-sm text-gray-500'>
            <span>{} transactions, page {} of {}</span>
            <div class='flex gap-2'>{}{}</div>
        </div>
    </div>"#,
        rows.join(""),
        total_count,
        current_page,
        total_pages,
        prev_button,
        next_button
    )
}

/// Current prices panel
pub(crate) fn render_prices(prices: &[(String, Option<f64>)], catalog: &CoinCatalog, vs_currency: &str) -> String {
    if prices.is_empty() {
        return "<p class='text-sm text-gray-500'>No coins held yet.</p>".to_string();
    }
    let rows: Vec<String> = prices
        .iter()
        .map(|(coin, price)| {
            format!(
                "<div class='flex justify-between py-2 border-b'><span>{}</span><span class='font-mono'>{}</span></div>",
                escape_html(catalog.display_name(coin)),
                format_price(*price)
            )
        })
        .collect();
    format!(
        "<div class='space-y-1'>{}</div><p class='text-xs text-gray-400 mt-2'>Prices in {}</p>",
        rows.join(""),
        escape_html(&vs_currency.to_uppercase())
    )
}

/// Batched price query for every coin held
pub(crate) async fn current_prices(state: &AppState) -> Result<Vec<(String, Option<f64>)>, ApiError> {
    let coins = state.manager.read().await.held_coins();
    if coins.is_empty() {
        return Ok(vec![]);
    }

    let timeout = state.config.market_timeout();
    let prices = tokio::time::timeout(timeout, state.market.prices(&coins))
        .await
        .map_err(|_| {
            ApiError::Core(CoreError::PriceTimeout {
                coin: coins.join(","),
                seconds: timeout.as_secs(),
            })
        })??;

    Ok(coins
        .into_iter()
        .map(|coin| {
            let price = prices.get(&coin).copied().flatten();
            (coin, price)
        })
        .collect())
}

fn list_params(state: &AppState, params: &HashMap<String, String>) -> (String, usize, usize) {
    let query = params.get("q").cloned().unwrap_or_default();
    let offset = params.get("offset").and_then(|s| s.parse().ok()).unwrap_or(0);
    let limit = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .filter(|l: &usize| *l > 0)
        .unwrap_or_else(|| state.config.pagination.records_per_page.max(1))
        .min(MAX_PAGE_SIZE);
    (query, offset, limit)
}

// ==================== JSON API ====================

/// Get transactions matching `q` (JSON API)
pub async fn api_transactions(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> String {
    let manager = state.manager.read().await;
    let query = params.get("q").map(|s| s.as_str()).unwrap_or("");
    let transactions = manager.search(query);

    serde_json::to_string(&serde_json::json!({
        "query": query,
        "total_count": transactions.len(),
        "transactions": transactions,
    }))
    .unwrap_or_default()
}

/// Form state (JSON API)
pub async fn api_state(state: axum::extract::State<AppState>) -> String {
    let manager = state.manager.read().await;
    serde_json::to_string(&serde_json::json!({
        "mode": manager.mode(),
        "draft": manager.draft(),
        "errors": manager.errors(),
        "busy": manager.is_busy(),
        "pending_coin": manager.pending_coin(),
        "transaction_count": manager.len(),
        "catalog_loaded": manager.catalog().is_loaded(),
        "catalog_size": manager.catalog().len(),
    }))
    .unwrap_or_default()
}

/// Current prices of held coins (JSON API)
pub async fn api_prices(state: axum::extract::State<AppState>) -> Result<String, ApiError> {
    let prices = current_prices(&state).await?;
    let entries: Vec<serde_json::Value> = prices
        .iter()
        .map(|(coin, price)| serde_json::json!({ "coin": coin, "price": price }))
        .collect();
    Ok(serde_json::to_string(&serde_json::json!({
        "vs_currency": state.config.market.vs_currency,
        "prices": entries,
    }))
    .unwrap_or_default())
}

// ==================== HTMX Fragments ====================

/// Transaction list fragment, filtered by `q`
pub async fn htmx_transactions_list(
    state: axum::extract::State<AppState>,
    params: Query<HashMap<String, String>>,
) -> Html<String> {
    let (query, offset, limit) = list_params(&state, &params);
    let manager = state.manager.read().await;
    Html(render_list(&manager, &query, offset, limit))
}

/// Form fragment for the current mode
pub async fn htmx_transaction_form(state: axum::extract::State<AppState>) -> Html<String> {
    let manager = state.manager.read().await;
    Html(render_form(&manager))
}

/// Validate the field named by `HX-Trigger-Name` and return its error text.
/// Without that header every posted field is applied and the whole form
/// is returned.
pub async fn htmx_transaction_draft(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
    body: String,
) -> Html<String> {
    let params = parse_form(&body);
    let trigger = headers
        .get("hx-trigger-name")
        .and_then(|v| v.to_str().ok())
        .and_then(|name| name.parse::<FormField>().ok());

    let mut manager = state.manager.write().await;
    match trigger {
        Some(field) => {
            let value = params.get(field.name()).map(|s| s.as_str()).unwrap_or("");
            match manager.set_field(field, value) {
                Ok(error) => Html(escape_html(&error.unwrap_or_default())),
                Err(e) => Html(escape_html(&e.to_string())),
            }
        }
        None => {
            let result = apply_form(&mut manager, &params);
            let mut html = render_form(&manager);
            if let Err(e) = result {
                html.push_str(&notice_html(notice_kind(&e), &e.to_string(), true));
            }
            Html(html)
        }
    }
}

/// Submit the form: create with a fresh price, or update the edited row
pub async fn htmx_transaction_submit(state: axum::extract::State<AppState>, body: String) -> Response {
    let params = parse_form(&body);
    let result = state.submit_form(&params).await;

    let manager = state.manager.read().await;
    let form = render_form(&manager);
    match result {
        Ok(outcome) => {
            let message = match outcome {
                SubmitOutcome::Created { index } => format!("Transaction #{} added.", index + 1),
                SubmitOutcome::Updated { index } => format!("Transaction #{} updated.", index + 1),
            };
            let html = format!("{}{}", form, notice_html(NoticeKind::Success, &message, true));
            (TRANSACTIONS_CHANGED, Html(html)).into_response()
        }
        Err(e) => {
            log_error("Submit", &e);
            let html = format!("{}{}", form, notice_html(notice_kind(&e), &e.to_string(), true));
            Html(html).into_response()
        }
    }
}

/// Enter edit mode on row `index`
pub async fn htmx_transaction_edit(state: axum::extract::State<AppState>, Path(index): Path<usize>) -> Response {
    let mut manager = state.manager.write().await;
    match manager.edit(index) {
        Ok(()) => {
            let html = format!("{}{}", render_form(&manager), empty_notice(true));
            (MODE_CHANGED, Html(html)).into_response()
        }
        Err(e) => {
            log_error("Edit", &e);
            let html = format!("{}{}", render_form(&manager), notice_html(notice_kind(&e), &e.to_string(), true));
            Html(html).into_response()
        }
    }
}

/// Delete row `index`
pub async fn htmx_transaction_delete(state: axum::extract::State<AppState>, Path(index): Path<usize>) -> Response {
    let mut manager = state.manager.write().await;
    match manager.delete(index) {
        Ok(_) => {
            let message = format!("Transaction #{} deleted.", index + 1);
            let html = format!("{}{}", render_form(&manager), notice_html(NoticeKind::Success, &message, true));
            (TRANSACTIONS_CHANGED, Html(html)).into_response()
        }
        Err(e) => {
            log_error("Delete", &e);
            let html = format!("{}{}", render_form(&manager), notice_html(notice_kind(&e), &e.to_string(), true));
            Html(html).into_response()
        }
    }
}

/// Cancel the price lookup of a pending create. The submit request then
/// answers with the cancellation notice.
pub async fn htmx_lookup_cancel(state: axum::extract::State<AppState>) -> Result<Html<String>, ApiError> {
    state.manager.read().await.cancel_pending()?;
    Ok(Html(String::new()))
}

/// Current prices panel fragment
pub async fn htmx_prices(state: axum::extract::State<AppState>) -> Html<String> {
    match current_prices(&state).await {
        Ok(prices) => {
            let manager = state.manager.read().await;
            Html(render_prices(&prices, manager.catalog(), &state.config.market.vs_currency))
        }
        Err(e) => {
            log::error!("Failed to fetch current prices: {}", e);
            Html("<p class='text-sm text-gray-500'>Current prices unavailable.</p>".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{body_text, state, state_with};
    use axum::extract::State;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};

    fn query(pairs: &[(&str, &str)]) -> Query<HashMap<String, String>> {
        Query(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[tokio::test]
    async fn test_list_filters_and_keeps_positions() {
        let state = state();
        let Html(html) = htmx_transactions_list(State(state), query(&[("q", "ETH")])).await;
        assert!(html.contains("/transactions/1/edit"));
        assert!(!html.contains("/transactions/0/edit"));
        assert!(html.contains("1 transactions, page 1 of 1"));
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let state = state();
        let Html(html) = htmx_transactions_list(State(state), query(&[("limit", "1"), ("offset", "1")])).await;
        assert!(html.contains("page 2 of 2"));
        assert!(html.contains("Previous"));
        assert!(!html.contains(">Next<"));
    }

    #[tokio::test]
    async fn test_list_extreme_offset_and_limit() {
        let max = usize::MAX.to_string();

        let Html(html) = htmx_transactions_list(State(state()), query(&[("offset", &max), ("limit", "1")])).await;
        assert!(html.contains("Previous"));
        assert!(!html.contains(">Next<"));
        assert!(!html.contains("/transactions/0/edit"));

        let Html(html) = htmx_transactions_list(State(state()), query(&[("offset", &max), ("limit", &max)])).await;
        assert!(html.contains("2 transactions, page"));
        assert!(!html.contains(">Next<"));

        let Html(html) = htmx_transactions_list(State(state()), query(&[("limit", &max)])).await;
        assert!(html.contains("page 1 of 1"));
        assert!(html.contains("/transactions/0/edit"));
        assert!(html.contains("/transactions/1/edit"));
    }

    #[test]
    fn test_list_limit_is_capped() {
        let state = state();
        let params: HashMap<String, String> = [("limit".to_string(), "100000".to_string())].into_iter().collect();
        let (_, offset, limit) = list_params(&state, &params);
        assert_eq!(offset, 0);
        assert_eq!(limit, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_list_no_match() {
        let Html(html) = htmx_transactions_list(State(state()), query(&[("q", "<solana>")])).await;
        assert!(html.contains("No transactions match \"&lt;solana&gt;\""));
    }

    #[tokio::test]
    async fn test_form_labels_follow_mode() {
        let state = state();
        let Html(html) = htmx_transaction_form(State(state.clone())).await;
        assert!(html.contains("Add transaction"));
        assert!(!html.contains("name='coinValue'"));

        state.manager.write().await.edit(1).unwrap();
        let Html(html) = htmx_transaction_form(State(state)).await;
        assert!(html.contains("Update transaction"));
        assert!(html.contains("Editing transaction #2"));
        assert!(html.contains("name='coinValue' value='2300'"));
    }

    #[tokio::test]
    async fn test_draft_validates_trigger_field() {
        let state = state();
        let mut headers = HeaderMap::new();
        headers.insert("hx-trigger-name", HeaderValue::from_static("date"));
        let Html(html) =
            htmx_transaction_draft(State(state.clone()), headers.clone(), "date=&amountPaid=".to_string()).await;
        assert_eq!(html, "date is required!");
        // Only the triggering field is validated
        assert!(state.manager.read().await.errors().get(FormField::AmountPaid).is_none());

        let Html(html) = htmx_transaction_draft(State(state), headers, "date=2024-03-03".to_string()).await;
        assert_eq!(html, "");
    }

    #[tokio::test]
    async fn test_draft_without_trigger_returns_form() {
        let state = state();
        let Html(html) =
            htmx_transaction_draft(State(state), HeaderMap::new(), "amountPaid=&date=2024-01-01".to_string()).await;
        assert!(html.contains("id='transaction-form'"));
        assert!(html.contains("amountPaid is required!"));
    }

    #[tokio::test]
    async fn test_submit_creates_and_triggers_refresh() {
        let state = state();
        let response = htmx_transaction_submit(
            State(state.clone()),
            "date=2024-06-01&amountPaid=50&coinBought=ethereum".to_string(),
        )
        .await;
        assert_eq!(response.headers().get("hx-trigger").unwrap(), "transactions-changed");
        let html = body_text(response).await;
        assert!(html.contains("Transaction #3 added."));

        let manager = state.manager.read().await;
        assert_eq!(manager.get(2).unwrap().coin_value, Some(3000.0));
        assert_eq!(manager.draft().coin_bought, "");
    }

    #[tokio::test]
    async fn test_submit_invalid_shows_generic_notice() {
        let state = state();
        let response = htmx_transaction_submit(State(state.clone()), "date=2024-06-01".to_string()).await;
        assert!(response.headers().get("hx-trigger").is_none());
        let html = body_text(response).await;
        assert!(html.contains("Please fill in all fields correctly."));
        assert!(html.contains("coinBought is required!"));
        assert_eq!(state.manager.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_price_failure_keeps_draft() {
        let state = state_with(true);
        let response = htmx_transaction_submit(
            State(state.clone()),
            "date=2024-06-01&amountPaid=50&coinBought=bitcoin".to_string(),
        )
        .await;
        let html = body_text(response).await;
        assert!(html.contains("Could not fetch the price of bitcoin"));
        assert!(html.contains("value='50'"));
        assert_eq!(state.manager.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_edit_and_delete() {
        let state = state();
        let response = htmx_transaction_edit(State(state.clone()), Path(1)).await;
        assert_eq!(response.headers().get("hx-trigger").unwrap(), "mode-changed");

        let response = htmx_transaction_delete(State(state.clone()), Path(0)).await;
        assert_eq!(response.headers().get("hx-trigger").unwrap(), "transactions-changed");
        let html = body_text(response).await;
        assert!(html.contains("Transaction #1 deleted."));
        // The edited record moved up one position
        assert!(html.contains("Editing transaction #1"));

        let manager = state.manager.read().await;
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.mode(), Mode::Editing { index: 0 });
    }

    #[tokio::test]
    async fn test_delete_out_of_range() {
        let state = state();
        let response = htmx_transaction_delete(State(state.clone()), Path(9)).await;
        assert!(response.headers().get("hx-trigger").is_none());
        let html = body_text(response).await;
        assert!(html.contains("Transaction not found at position 9"));
        assert_eq!(state.manager.read().await.len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_without_pending_lookup() {
        let err = htmx_lookup_cancel(State(state())).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_prices_panel() {
        let state = state();
        state.refresh_catalog().await.unwrap();
        let Html(html) = htmx_prices(State(state)).await;
        assert!(html.contains("Bitcoin"));
        assert!(html.contains("65,000.00"));
        assert!(html.contains("Prices in USD"));

        let Html(html) = htmx_prices(State(state_with(true))).await;
        assert!(html.contains("Current prices unavailable."));
    }

    #[tokio::test]
    async fn test_api_transactions_json() {
        let json = api_transactions(State(state()), query(&[("q", "bitcoin")])).await;
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_count"], 1);
        assert_eq!(value["transactions"][0]["index"], 0);
        assert_eq!(value["transactions"][0]["coinBought"], "bitcoin");
    }

    #[tokio::test]
    async fn test_api_state_json() {
        let state = state();
        state.manager.write().await.edit(0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&api_state(State(state)).await).unwrap();
        assert_eq!(value["mode"]["mode"], "editing");
        assert_eq!(value["mode"]["index"], 0);
        assert_eq!(value["draft"]["amountPaid"], "100");
        assert_eq!(value["busy"], false);
    }

    #[tokio::test]
    async fn test_api_prices_json() {
        let json = api_prices(State(state())).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["vs_currency"], "usd");
        assert_eq!(value["prices"][0]["coin"], "bitcoin");
        assert_eq!(value["prices"][0]["price"], 65000.0);

        let err = api_prices(State(state_with(true))).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
