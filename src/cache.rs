//! Process-lifetime reference-data cache.
//!
//! A read-through cache with no TTL and no eviction: once a key is
//! populated it stays for the life of the process. Production code never
//! invalidates it; [`RefCache::clear`] exists so tests can reset state
//! between cases.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// In-memory cache keyed by `K`, shared across concurrent callers.
#[derive(Debug, Default)]
pub struct RefCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> RefCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a cached value.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        match self.entries.read() {
            Ok(entries) => entries.get(key).cloned(),
            // A poisoned lock means a writer panicked; treat it as a miss.
            Err(_) => None,
        }
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn put(&self, key: K, value: V) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, value);
        }
    }

    /// Drop every entry. Test hook; production code keeps entries for
    /// the process lifetime.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of populated keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True when nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
