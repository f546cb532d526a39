//! Durable key/value storage backing the lookup cache.
//!
//! Values are opaque strings (the gateway stores JSON). No expiry is managed
//! here; entries live until the database is removed.

mod schema;
mod sqlite_cache_store;

pub use sqlite_cache_store::SqliteCacheStore;

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Number of stored entries, used for stats only.
    fn len(&self) -> Result<usize>;
}

/// Process-local store, lost on restart. Used by tests and when no cache
/// database is configured.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Cache lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Cache lock poisoned"))?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryCacheStore::new();
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap(), Some("value".to_string()));
        assert_eq!(store.len().unwrap(), 1);
    }
}
