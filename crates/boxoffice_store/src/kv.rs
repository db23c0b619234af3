//! Best-effort key-value storage for small client state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Result type for key-value storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from key-value persistence.
///
/// Persistence is best-effort: these errors are reported to the caller,
/// who decides whether to surface a warning or continue in degraded mode.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The underlying storage rejected the operation.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored value could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable string key-value storage.
///
/// Used for persisting small client state (pagination positions) across
/// sessions. Values are opaque strings; callers own the encoding.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, `None` when the key is absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Writes a value, replacing any existing one.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// An in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail, for degraded-mode tests.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Backend("storage unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check()?;
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check()?;
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.check()?;
        self.entries.lock().remove(key);
        Ok(())
    }
}
