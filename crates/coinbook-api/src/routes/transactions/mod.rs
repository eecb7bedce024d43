//! Transaction routes - Form, list, search, current prices
//!
//! Features:
//! - Create with a price lookup, edit, delete
//! - Incremental per-field validation
//! - Search by date, coin or amount, with pagination
//! - HTMX partial page updates
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{
    api_prices,
    api_state,
    api_transactions,
    htmx_lookup_cancel,
    htmx_prices,
    htmx_transaction_delete,
    htmx_transaction_draft,
    htmx_transaction_edit,
    htmx_transaction_form,
    htmx_transaction_submit,
    htmx_transactions_list,
};

pub use page::page_index;
