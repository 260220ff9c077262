//! Statistics store abstraction and common types.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A key-value store holding precomputed collection statistics.
///
/// The store itself is shared; lookups go through connections obtained with
/// [`StatisticsStore::connect`], mirroring a client for a remote key-value
/// server.
pub trait StatisticsStore: Send + Sync + std::fmt::Debug {
    /// Open a new connection to the store.
    fn connect(&self) -> Result<Box<dyn StatisticsConnection>>;

    /// Get the name of this store type.
    fn store_type(&self) -> &str;
}

/// A live connection to a statistics store.
///
/// A connection is used by one thread at a time.
pub trait StatisticsConnection: Send + std::fmt::Debug {
    /// Get the raw value stored under `key`, or `None` if the key is absent.
    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Close the connection and release its resources.
    fn close(&mut self) -> Result<()>;

    /// Check if the connection is still open.
    fn is_open(&self) -> bool;
}

/// Configuration for a [`CollectionStatisticsClient`](super::CollectionStatisticsClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Maximum number of idle connections kept for reuse.
    pub max_idle_connections: usize,

    /// Whether to cache resolved statistics for the lifetime of the client.
    pub cache_enabled: bool,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        StatisticsConfig {
            max_idle_connections: num_cpus::get(),
            cache_enabled: false,
        }
    }
}

impl StatisticsConfig {
    /// Set the maximum number of idle connections.
    pub fn with_max_idle_connections(mut self, max_idle_connections: usize) -> Self {
        self.max_idle_connections = max_idle_connections;
        self
    }

    /// Enable or disable the statistics cache.
    pub fn with_cache(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }
}
