//! Core purchase-record management and business logic

pub mod catalog;
pub mod error;
pub mod manager;
pub mod models;
pub mod resolver;
pub mod search;
pub mod store;
pub mod validation;

pub use catalog::CoinCatalog;
pub use error::{CoreError, CoreResult, ErrorCode, ErrorDetails, ErrorSeverity};
pub use manager::{PriceRequest, Submission, SubmitOutcome, TransactionManager};
pub use models::{FormField, IndexedTransaction, Mode, Transaction, TransactionDraft};
pub use resolver::{cancel_pair, resolve_price, CancelHandle, CancelSignal};
pub use search::filter_transactions;
pub use store::{store_from_config, JsonFileStore, MemoryStore, StoreRef, TransactionStore};
pub use validation::{blocking_fields, validate_field, FieldErrors};
