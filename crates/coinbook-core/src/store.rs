//! Persistence adapters for the transaction list
//!
//! The whole list lives under one key and is rewritten on every change.

use crate::error::CoreResult;
use crate::models::Transaction;
use coinbook_config::{Config, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Store reference type
pub type StoreRef = Arc<dyn TransactionStore>;

/// Trait for transaction list storage
pub trait TransactionStore: Send + Sync {
    /// Previously saved list. Missing or unreadable data yields an empty list.
    fn load(&self) -> Vec<Transaction>;

    /// Replace the stored list with `transactions`
    fn save(&self, transactions: &[Transaction]) -> CoreResult<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Build the store selected in the configuration
pub fn store_from_config(config: &Config) -> StoreRef {
    match config.storage.backend {
        StorageBackend::File => Arc::new(JsonFileStore::new(config.storage_file())),
        StorageBackend::Memory => Arc::new(MemoryStore::default()),
    }
}

/// Decode a stored value, falling back to an empty list
fn decode(raw: &str, origin: &str) -> Vec<Transaction> {
    match serde_json::from_str::<Vec<Transaction>>(raw) {
        Ok(transactions) => transactions,
        Err(e) => {
            log::warn!("Stored transactions in {} are not readable, starting empty: {}", origin, e);
            Vec::new()
        }
    }
}

// ==================== JSON File Store ====================

/// One JSON file holding the serialized list
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TransactionStore for JsonFileStore {
    fn load(&self) -> Vec<Transaction> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => decode(&raw, &self.describe()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No stored transactions at {}", self.path.display());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Failed to read {}, starting empty: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, transactions: &[Transaction]) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string(transactions)?;

        // Write aside, then rename over the target
        let temp = self.temp_path();
        std::fs::write(&temp, raw)?;
        std::fs::rename(&temp, &self.path)?;

        log::debug!("Saved {} transactions to {}", transactions.len(), self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ==================== Memory Store ====================

/// Keeps the serialized list in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Start from an already serialized value, as if read from storage
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
        }
    }

    /// The currently stored value
    pub fn raw(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }
}

impl TransactionStore for MemoryStore {
    fn load(&self) -> Vec<Transaction> {
        match self.raw() {
            Some(raw) => decode(&raw, "memory"),
            None => Vec::new(),
        }
    }

    fn save(&self, transactions: &[Transaction]) -> CoreResult<()> {
        let raw = serde_json::to_string(transactions)?;
        let mut guard = self.value.lock().map_err(|_| crate::error::CoreError::Storage {
            message: "memory store lock poisoned".to_string(),
        })?;
        *guard = Some(raw);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
