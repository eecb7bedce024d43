//! Transactions page rendering - Full page endpoints

use super::api::{render_form, render_list};
use crate::{empty_notice, AppState};

/// Main page: search, form, current prices and the transaction list
pub async fn page_index(
    state: axum::extract::State<AppState>,
    headers: axum::http::HeaderMap,
) -> axum::response::Html<String> {
    let manager = state.manager.read().await;
    let limit = state.config.pagination.records_per_page.max(1);

    let inner_content = format!(
        r#"{}
        <div class='grid grid-cols-1 lg:grid-cols-3 gap-6 mb-6'>
            <div class='lg:col-span-2'>{}</div>
            <div class='bg-white rounded-xl shadow-sm p-6'>
                <h3 class='text-lg font-semibold mb-4'>Current prices</h3>
                <div id='prices-panel' hx-get='/transactions/prices' hx-trigger='load, transactions-changed from:body'>
                    <p class='text-sm text-gray-500'>Loading...</p>
                </div>
            </div>
        </div>
        <div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Transactions</h2>
            <input id='search' type='search' name='q' placeholder='Search by date, coin or amount...'
                class='w-72 px-3 py-2 border rounded-lg'
                hx-get='/transactions/list' hx-trigger='input changed delay:300ms, search' hx-target='#transactions-content'>
        </div>
        <div id='transactions-content' hx-get='/transactions/list' hx-include='#search'
            hx-trigger='transactions-changed from:body, mode-changed from:body'>{}</div>"#,
        empty_notice(false),
        render_form(&manager),
        render_list(&manager, "", 0, limit)
    );

    axum::response::Html(crate::page_response(&headers, "Transactions", &inner_content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::state;
    use axum::extract::State;
    use axum::http::HeaderMap;

    #[tokio::test]
    async fn test_index_page_has_all_panels() {
        let axum::response::Html(html) = page_index(State(state()), HeaderMap::new()).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        for id in ["id='notice'", "id='transaction-form'", "id='prices-panel'", "id='search'", "id='transactions-content'"] {
            assert!(html.contains(id), "missing {}", id);
        }
        assert!(html.contains("2 transactions, page 1 of 1"));
    }
}
