//! In-memory statistics store for testing and preloaded statistics.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::{Result, ScoreScriptError};
use crate::statistics::StatisticKind;
use crate::statistics::traits::{StatisticsConnection, StatisticsStore};

/// Connection bookkeeping shared between a store and its connections.
#[derive(Debug, Default)]
struct ConnectionCounters {
    open: AtomicUsize,
    opened: AtomicUsize,
    lookups: AtomicUsize,
}

/// An in-memory statistics store.
///
/// Cloning the store shares the underlying entries, so values inserted after
/// a connection was opened are visible through it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatisticsStore {
    /// Raw values keyed by store key.
    entries: Arc<RwLock<AHashMap<String, String>>>,
    /// Connection counters.
    counters: Arc<ConnectionCounters>,
}

impl MemoryStatisticsStore {
    /// Create an empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from raw `(key, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut entries = store.entries.write();
            for (key, value) in pairs {
                entries.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Insert a raw value under `key`.
    pub fn insert<K: Into<String>, V: Into<String>>(&self, key: K, value: V) {
        self.entries.write().insert(key.into(), value.into());
    }

    /// Insert a statistic for `term`, building the key from `kind`.
    pub fn insert_statistic(&self, kind: StatisticKind, term: &str, value: f64) {
        self.insert(kind.key(term), value.to_string());
    }

    /// Insert the fallback value for `kind`.
    pub fn insert_fallback(&self, kind: StatisticKind, value: f64) {
        self.insert(kind.fallback_key(), value.to_string());
    }

    /// Remove a key.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Get the number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    /// Number of connections opened over the store's lifetime.
    pub fn total_connections(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Number of key lookups served over the store's lifetime.
    pub fn lookup_count(&self) -> usize {
        self.counters.lookups.load(Ordering::SeqCst)
    }
}

impl StatisticsStore for MemoryStatisticsStore {
    fn connect(&self) -> Result<Box<dyn StatisticsConnection>> {
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(store = self.store_type(), "opened statistics connection");

        Ok(Box::new(MemoryConnection {
            entries: Arc::clone(&self.entries),
            counters: Arc::clone(&self.counters),
            closed: false,
        }))
    }

    fn store_type(&self) -> &str {
        "memory"
    }
}

/// A connection to a [`MemoryStatisticsStore`].
#[derive(Debug)]
pub struct MemoryConnection {
    entries: Arc<RwLock<AHashMap<String, String>>>,
    counters: Arc<ConnectionCounters>,
    closed: bool,
}

impl MemoryConnection {
    /// Check if the connection is closed.
    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(ScoreScriptError::storage("Connection is closed"))
        } else {
            Ok(())
        }
    }
}

impl StatisticsConnection for MemoryConnection {
    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.check_closed()?;
        self.counters.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.read().get(key).cloned())
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.counters.open.fetch_sub(1, Ordering::SeqCst);
            tracing::trace!("closed statistics connection");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_get() {
        let store = MemoryStatisticsStore::from_pairs([("tf:cat", "0.01"), ("tf:min_tf", "1e-7")]);
        let mut conn = store.connect().unwrap();

        assert_eq!(conn.get("tf:cat").unwrap(), Some("0.01".to_string()));
        assert_eq!(conn.get("tf:dog").unwrap(), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup_count(), 2);
    }

    #[test]
    fn test_memory_store_insert_statistic() {
        let store = MemoryStatisticsStore::new();
        assert!(store.is_empty());

        store.insert_statistic(StatisticKind::InverseDocumentFrequency, "a:b", 2.5);
        store.insert_fallback(StatisticKind::InverseDocumentFrequency, 9.0);

        let mut conn = store.connect().unwrap();
        assert_eq!(conn.get("idf:a-b").unwrap(), Some("2.5".to_string()));
        assert_eq!(conn.get("idf:max_idf").unwrap(), Some("9".to_string()));

        assert_eq!(store.remove("idf:a-b"), Some("2.5".to_string()));
        assert_eq!(conn.get("idf:a-b").unwrap(), None);
    }

    #[test]
    fn test_connection_lifecycle() {
        let store = MemoryStatisticsStore::new();

        let mut conn = store.connect().unwrap();
        let other = store.connect().unwrap();
        assert_eq!(store.open_connections(), 2);
        assert_eq!(store.total_connections(), 2);

        conn.close().unwrap();
        assert!(!conn.is_open());
        assert_eq!(store.open_connections(), 1);
        assert!(conn.get("tf:cat").is_err());

        // Closing twice is a no-op.
        conn.close().unwrap();
        assert_eq!(store.open_connections(), 1);

        drop(other);
        assert_eq!(store.open_connections(), 0);
        assert_eq!(store.total_connections(), 2);
    }
}
