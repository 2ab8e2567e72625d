//! Local key/value persistence.
//!
//! The catalog and the cart are each persisted as a JSON string under a fixed
//! key. [`DirectoryStore`] keeps one file per key on disk; [`MemoryStore`]
//! keeps everything in process memory and is used by tests and ephemeral
//! sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, error};

pub mod directory;

pub use directory::DirectoryStore;

/// Key under which the product catalog is persisted
pub const CATALOG_KEY: &str = "cafe_productos";

/// Key under which the cart is persisted
pub const CART_KEY: &str = "cafe_carrito";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage is unavailable: {0}")]
    Unavailable(String),
}

/// A string store that survives process restarts
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing was stored
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` if the backing store cannot be read.
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` if the value cannot be stored.
    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value, for setting up a previous session's state
    #[must_use]
    pub fn with_entry(self, key: &str, value: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.into());
        }
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Write-through mirror of one key.
///
/// Every write goes straight to the store. A failing write is returned to
/// the caller once; further consecutive failures are only logged until a
/// write succeeds again.
pub struct Mirror {
    storage: Arc<dyn KeyValueStore>,
    key: &'static str,
    failing: bool,
}

impl Mirror {
    pub fn new(storage: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            storage,
            key,
            failing: false,
        }
    }

    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Read the current persisted value
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read.
    pub fn load(&self) -> Result<Option<String>, PersistenceError> {
        self.storage.load(self.key)
    }

    /// Serialize `value` as JSON and write it through
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` for the first of a run of failed writes.
    pub fn write_json<T: serde::Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), PersistenceError> {
        let result = serde_json::to_string(value)
            .map_err(|source| PersistenceError::Serialize {
                key: self.key.to_string(),
                source,
            })
            .and_then(|text| self.storage.save(self.key, &text));
        self.settle(result)
    }

    fn settle(&mut self, result: Result<(), PersistenceError>) -> Result<(), PersistenceError> {
        match result {
            Ok(()) => {
                if self.failing {
                    debug!("Persistence of '{}' recovered", self.key);
                }
                self.failing = false;
                Ok(())
            }
            Err(e) if self.failing => {
                debug!("Persistence of '{}' still failing: {e}", self.key);
                Ok(())
            }
            Err(e) => {
                error!("Persistence of '{}' failed: {e}", self.key);
                self.failing = true;
                Err(e)
            }
        }
    }

    /// True while the last write failed
    #[must_use]
    pub fn is_failing(&self) -> bool {
        self.failing
    }
}
