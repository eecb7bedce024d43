//! Route modules for the API server
//!
//! - transactions: Main page, form, list, search, current prices
//! - coins: Coin selector options, catalog JSON and refresh
//! - settings: Configuration display
//!
//! Each module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API endpoints and HTMX fragments
//! - page.rs: HTMX page rendering

pub mod coins;
pub mod settings;
pub mod transactions;

use coinbook_core::{CoreResult, FormField, TransactionManager};
use std::collections::HashMap;

/// Decode an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &str) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = HashMap::new();
    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = urlencoding::decode(&key.replace('+', " ")).unwrap_or_default().into_owned();
        let value = urlencoding::decode(&value.replace('+', " ")).unwrap_or_default().into_owned();
        params.insert(key, value);
    }
    params
}

/// Feed every form field present in `params` to the manager's draft
pub fn apply_form(manager: &mut TransactionManager, params: &HashMap<String, String>) -> CoreResult<()> {
    for field in FormField::ALL {
        if let Some(value) = params.get(field.name()) {
            manager.set_field(field, value)?;
        }
    }
    Ok(())
}
