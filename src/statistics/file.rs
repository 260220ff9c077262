//! File-backed statistics store.
//!
//! Loads a JSON object of `key -> value` pairs, the same shape as a dump of
//! the key-value server the statistics normally live in.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Result, ScoreScriptError};
use crate::statistics::memory::MemoryStatisticsStore;
use crate::statistics::traits::{StatisticsConnection, StatisticsStore};

/// A statistics store loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct FileStatisticsStore {
    /// The file the statistics were loaded from.
    path: PathBuf,
    /// Loaded entries.
    inner: MemoryStatisticsStore,
}

impl FileStatisticsStore {
    /// Load a statistics file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path)?;
        let inner = Self::parse(&content)?;

        tracing::debug!(
            path = %path.display(),
            keys = inner.len(),
            "loaded statistics file"
        );

        Ok(FileStatisticsStore { path, inner })
    }

    /// Parse statistics from a JSON object.
    ///
    /// Values may be strings or numbers; numbers are stored as their decimal
    /// rendering.
    pub fn parse(content: &str) -> Result<MemoryStatisticsStore> {
        let value: Value = serde_json::from_str(content)?;
        let object = value.as_object().ok_or_else(|| {
            ScoreScriptError::storage("statistics file must contain a JSON object")
        })?;

        let store = MemoryStatisticsStore::new();
        for (key, value) in object {
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(ScoreScriptError::storage(format!(
                        "statistic '{key}' must be a string or number, found {other}"
                    )));
                }
            };
            store.insert(key.clone(), raw);
        }

        Ok(store)
    }

    /// Get the path of the loaded file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the number of loaded keys.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the file held no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of connections currently open.
    pub fn open_connections(&self) -> usize {
        self.inner.open_connections()
    }
}

impl StatisticsStore for FileStatisticsStore {
    fn connect(&self) -> Result<Box<dyn StatisticsConnection>> {
        self.inner.connect()
    }

    fn store_type(&self) -> &str {
        "file"
    }
}
