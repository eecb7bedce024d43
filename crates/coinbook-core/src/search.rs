//! Free-text search over the transaction list

use crate::models::{IndexedTransaction, Transaction};

/// Transactions whose date, coin or amount contains `term`, ignoring case.
/// Results keep list order and carry their position in `transactions`.
/// An empty term matches everything.
pub fn filter_transactions(transactions: &[Transaction], term: &str) -> Vec<IndexedTransaction> {
    let needle = term.to_lowercase();
    transactions
        .iter()
        .enumerate()
        .filter(|(_, tx)| needle.is_empty() || tx.matches(&needle))
        .map(|(index, tx)| IndexedTransaction {
            index,
            transaction: tx.clone(),
        })
        .collect()
}
