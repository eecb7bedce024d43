//! Transaction Manager: the single owner of the list, the draft and the mode
//!
//! All mutations go through methods here so that validation, persistence
//! and the create/edit state machine are enforced in one place.
//!
//! Creating a transaction needs a price lookup. It is split in two steps so
//! callers holding the manager behind a lock can release it while the
//! network call runs:
//!
//! 1. `begin_submit` validates the draft and, in create mode, marks the
//!    manager busy and returns a `PriceRequest`.
//! 2. `complete_create` takes the lookup result and appends the record.
//!
//! `submit` chains both steps for callers that own the manager outright.

use crate::catalog::CoinCatalog;
use crate::error::{CoreError, CoreResult};
use crate::models::{FormField, IndexedTransaction, Mode, Transaction, TransactionDraft};
use crate::resolver::{cancel_pair, resolve_price, CancelHandle, CancelSignal};
use crate::search::filter_transactions;
use crate::store::StoreRef;
use crate::validation::{blocking_fields, parse_coin_value, validate_field, FieldErrors};
use coinbook_market::MarketDataSource;
use std::time::Duration;

/// A price lookup the manager is waiting on
#[derive(Debug)]
struct PendingLookup {
    ticket: u64,
    coin: String,
    draft: TransactionDraft,
    cancel: CancelHandle,
}

/// Work handed to the caller by `begin_submit` in create mode
#[derive(Debug)]
pub struct PriceRequest {
    pub ticket: u64,
    pub coin: String,
    pub cancel: CancelSignal,
}

/// Result of `begin_submit`
#[derive(Debug)]
pub enum Submission {
    /// Edit mode: the record was replaced and saved
    Updated { index: usize },
    /// Create mode: resolve the price, then call `complete_create`
    NeedsPrice(PriceRequest),
}

/// Result of a full submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { index: usize },
    Updated { index: usize },
}

pub struct TransactionManager {
    store: StoreRef,
    transactions: Vec<Transaction>,
    draft: TransactionDraft,
    errors: FieldErrors,
    mode: Mode,
    catalog: CoinCatalog,
    pending: Option<PendingLookup>,
    next_ticket: u64,
}

impl TransactionManager {
    /// Create a manager over `store`, loading the saved list
    pub fn new(store: StoreRef) -> Self {
        let transactions = store.load();
        log::info!("Loaded {} transactions from {}", transactions.len(), store.describe());
        Self {
            store,
            transactions,
            draft: TransactionDraft::default(),
            errors: FieldErrors::new(),
            mode: Mode::Creating,
            catalog: CoinCatalog::default(),
            pending: None,
            next_ticket: 1,
        }
    }

    // ==================== Read Access ====================

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn draft(&self) -> &TransactionDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// A price lookup is in flight
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Coin whose price is being looked up
    pub fn pending_coin(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.coin.as_str())
    }

    pub fn catalog(&self) -> &CoinCatalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: CoinCatalog) {
        self.catalog = catalog;
    }

    /// Transactions matching `term`, with their positions
    pub fn search(&self, term: &str) -> Vec<IndexedTransaction> {
        filter_transactions(&self.transactions, term)
    }

    /// Distinct coins in the list, in first-seen order
    pub fn held_coins(&self) -> Vec<String> {
        let mut coins: Vec<String> = Vec::new();
        for tx in &self.transactions {
            if !coins.iter().any(|c| c == &tx.coin_bought) {
                coins.push(tx.coin_bought.clone());
            }
        }
        coins
    }

    // ==================== Draft ====================

    fn ensure_idle(&self) -> CoreResult<()> {
        if self.is_busy() {
            Err(CoreError::Busy)
        } else {
            Ok(())
        }
    }

    /// Change one draft field and re-validate it.
    /// Returns the field's error message, if any.
    pub fn set_field(&mut self, field: FormField, value: &str) -> CoreResult<Option<String>> {
        self.ensure_idle()?;

        let error = validate_field(field, value);
        match field {
            FormField::Date => self.draft.date = value.to_string(),
            FormField::AmountPaid => self.draft.amount_paid = value.to_string(),
            FormField::CoinBought => self.draft.coin_bought = value.to_string(),
            FormField::CoinValue => {
                // Unparseable text is not kept; the error records it
                if error.is_none() {
                    self.draft.coin_value = parse_coin_value(value);
                }
            }
        }
        self.errors.set(field, error.clone());
        Ok(error)
    }

    /// Apply every field of `draft`, as if each was typed into the form
    pub fn apply_draft(&mut self, draft: &TransactionDraft) -> CoreResult<()> {
        for field in FormField::ALL {
            self.set_field(field, &draft.get(field))?;
        }
        Ok(())
    }

    fn clear_draft(&mut self) {
        self.draft = TransactionDraft::default();
        self.errors.clear();
    }

    // ==================== Edit / Delete ====================

    fn check_index(&self, index: usize) -> CoreResult<()> {
        if index < self.transactions.len() {
            Ok(())
        } else {
            Err(CoreError::TransactionNotFound { index })
        }
    }

    /// Persist `next` and make it the current list
    fn commit(&mut self, next: Vec<Transaction>) -> CoreResult<()> {
        self.store.save(&next)?;
        self.transactions = next;
        Ok(())
    }

    /// Enter edit mode on row `index`, loading it into the draft
    pub fn edit(&mut self, index: usize) -> CoreResult<()> {
        self.ensure_idle()?;
        self.check_index(index)?;

        self.draft = TransactionDraft::from(&self.transactions[index]);
        self.errors.clear();
        self.mode = Mode::Editing { index };
        log::debug!("Editing transaction {}", index);
        Ok(())
    }

    /// Remove row `index` and persist
    pub fn delete(&mut self, index: usize) -> CoreResult<Transaction> {
        self.ensure_idle()?;
        self.check_index(index)?;

        let mut next = self.transactions.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        // Keep the edit index on the same record
        if let Mode::Editing { index: editing } = self.mode {
            if editing == index {
                self.mode = Mode::Creating;
                self.clear_draft();
            } else if editing > index {
                self.mode = Mode::Editing { index: editing - 1 };
            }
        }

        log::info!("Deleted transaction {} ({} on {})", index, removed.coin_bought, removed.date);
        Ok(removed)
    }

    // ==================== Submit ====================

    /// Validate the draft and start a submit. See the module docs.
    pub fn begin_submit(&mut self) -> CoreResult<Submission> {
        self.ensure_idle()?;

        let blocked = blocking_fields(&self.draft, &self.errors, self.mode);
        if !blocked.is_empty() {
            for &field in &blocked {
                if self.errors.get(field).is_none() {
                    self.errors.set(field, validate_field(field, &self.draft.get(field)));
                }
            }
            return Err(CoreError::ValidationError {
                fields: blocked.iter().map(|f| f.name().to_string()).collect(),
            });
        }

        match self.mode {
            Mode::Editing { index } => {
                self.check_index(index)?;
                let mut next = self.transactions.clone();
                next[index] = self.draft.to_transaction();
                self.commit(next)?;
                self.clear_draft();
                self.mode = Mode::Creating;
                log::info!("Updated transaction {}", index);
                Ok(Submission::Updated { index })
            }
            Mode::Creating => {
                let ticket = self.next_ticket;
                self.next_ticket += 1;
                let coin = self.draft.coin_bought.trim().to_string();
                let (handle, signal) = cancel_pair();
                self.pending = Some(PendingLookup {
                    ticket,
                    coin: coin.clone(),
                    draft: self.draft.clone(),
                    cancel: handle,
                });
                Ok(Submission::NeedsPrice(PriceRequest { ticket, coin, cancel: signal }))
            }
        }
    }

    /// Finish a create with the outcome of its price lookup.
    ///
    /// On any error the draft is kept and nothing is persisted.
    pub fn complete_create(&mut self, ticket: u64, price: CoreResult<Option<f64>>) -> CoreResult<usize> {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                return Err(CoreError::NoPendingLookup);
            }
        };

        let price = price?;
        let mut next = self.transactions.clone();
        next.push(pending.draft.with_price(price));
        self.commit(next)?;
        self.clear_draft();

        let index = self.transactions.len() - 1;
        log::info!("Created transaction {} ({} at {:?})", index, pending.coin, price);
        Ok(index)
    }

    /// Ask the in-flight price lookup to stop
    pub fn cancel_pending(&self) -> CoreResult<()> {
        match self.pending {
            Some(ref pending) => {
                pending.cancel.cancel();
                Ok(())
            }
            None => Err(CoreError::NoPendingLookup),
        }
    }

    /// Validate, resolve the price when creating, and persist
    pub async fn submit(&mut self, source: &dyn MarketDataSource, timeout: Duration) -> CoreResult<SubmitOutcome> {
        match self.begin_submit()? {
            Submission::Updated { index } => Ok(SubmitOutcome::Updated { index }),
            Submission::NeedsPrice(request) => {
                let price = resolve_price(source, &request.coin, timeout, request.cancel).await;
                let index = self.complete_create(request.ticket, price)?;
                Ok(SubmitOutcome::Created { index })
            }
        }
    }
}

// ==================== Tests ====================
