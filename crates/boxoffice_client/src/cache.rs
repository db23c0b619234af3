//! Explicit record cache with optional TTL.
//!
//! Owned by the composing application and constructed once at startup,
//! so cached state never leaks across tests or sessions the way a
//! module-level map would.

use boxoffice_document::Fields;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A keyed cache of sanitized records.
#[derive(Debug, Default)]
pub struct RecordCache {
    entries: RwLock<HashMap<String, (Instant, Fields)>>,
    ttl: Option<Duration>,
}

impl RecordCache {
    /// Creates a cache whose entries expire after `ttl`; `None` disables
    /// expiry.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, key: impl Into<String>, record: Fields) {
        self.entries
            .write()
            .insert(key.into(), (Instant::now(), record));
    }

    /// Reads a record; expired entries are removed and reported absent.
    pub fn get(&self, key: &str) -> Option<Fields> {
        let expired = {
            let entries = self.entries.read();
            let (inserted_at, record) = entries.get(key)?;
            match self.ttl {
                Some(ttl) if inserted_at.elapsed() > ttl => true,
                _ => return Some(record.clone()),
            }
        };
        if expired {
            self.entries.write().remove(key);
        }
        None
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, including any not yet swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
