//! Collection statistics client with fallback lookup.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::error::{Result, ScoreScriptError};
use crate::statistics::traits::{StatisticsConfig, StatisticsConnection, StatisticsStore};
use crate::statistics::{StatisticKind, TOTAL_TERM_FREQUENCY_KEY, TermStatistics, parse_statistic};

/// The outcome of resolving one term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticLookup {
    /// The term as given.
    pub term: String,
    /// The key the value was read from.
    pub key: String,
    /// Whether the sentinel key supplied the value.
    pub fallback_used: bool,
    /// The parsed value.
    pub value: f64,
}

/// Looks up one kind of collection statistic in a [`StatisticsStore`].
///
/// A client is opened once per query and released when dropped. Lookups check
/// a connection out of an internal pool, so one client can serve concurrent
/// scoring threads.
#[derive(Debug)]
pub struct CollectionStatisticsClient {
    /// Statistic kind this client resolves.
    kind: StatisticKind,
    /// The backing store.
    store: Arc<dyn StatisticsStore>,
    /// Idle connections ready for reuse.
    idle: Mutex<Vec<Box<dyn StatisticsConnection>>>,
    /// Client configuration.
    config: StatisticsConfig,
    /// Resolved values, present only when caching is enabled.
    cache: Option<RwLock<AHashMap<String, f64>>>,
    /// Log every lookup.
    verbose: bool,
}

impl CollectionStatisticsClient {
    /// Open a client on `store`.
    ///
    /// One connection is opened eagerly so an unreachable store is reported
    /// before any document is scored.
    pub fn open(
        store: Arc<dyn StatisticsStore>,
        kind: StatisticKind,
        config: StatisticsConfig,
    ) -> Result<Self> {
        let connection = store.connect()?;
        let cache = config
            .cache_enabled
            .then(|| RwLock::new(AHashMap::new()));

        tracing::trace!(store = store.store_type(), kind = %kind, "opened statistics client");

        Ok(CollectionStatisticsClient {
            kind,
            store,
            idle: Mutex::new(vec![connection]),
            config,
            cache,
            verbose: false,
        })
    }

    /// Log each lookup at debug level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Get the statistic kind.
    pub fn kind(&self) -> StatisticKind {
        self.kind
    }

    /// Get the client configuration.
    pub fn config(&self) -> &StatisticsConfig {
        &self.config
    }

    /// Number of idle pooled connections.
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().len()
    }

    /// Resolve `term`, reporting which key supplied the value.
    pub fn lookup(&self, term: &str) -> Result<StatisticLookup> {
        let key = self.kind.key(term);
        if let Some(raw) = self.fetch(&key)? {
            let value = parse_statistic(&key, &raw)?;
            return Ok(StatisticLookup {
                term: term.to_string(),
                key,
                fallback_used: false,
                value,
            });
        }

        let fallback_key = self.kind.fallback_key();
        match self.fetch(&fallback_key)? {
            Some(raw) => {
                let value = parse_statistic(&fallback_key, &raw)?;
                Ok(StatisticLookup {
                    term: term.to_string(),
                    key: fallback_key,
                    fallback_used: true,
                    value,
                })
            }
            None => Err(ScoreScriptError::StatisticsUnavailable { key, fallback_key }),
        }
    }

    /// Collection-wide total term frequency, if stored.
    pub fn total_term_frequency(&self) -> Result<Option<f64>> {
        self.fetch(TOTAL_TERM_FREQUENCY_KEY)?
            .map(|raw| parse_statistic(TOTAL_TERM_FREQUENCY_KEY, &raw))
            .transpose()
    }

    /// Close every pooled connection.
    ///
    /// Dropping the client does the same but can only log failures.
    pub fn close(self) -> Result<()> {
        self.release_all()
    }

    /// Read a raw value through a pooled connection.
    fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| conn.get(key))
    }

    /// Run `f` on a checked-out connection.
    ///
    /// A connection that fails with a storage error is closed instead of being
    /// returned to the pool.
    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut dyn StatisticsConnection) -> Result<T>,
    ) -> Result<T> {
        let checked_out = self.idle.lock().pop();
        let mut conn = match checked_out {
            Some(conn) => conn,
            None => self.store.connect()?,
        };

        let result = f(conn.as_mut());

        let broken = matches!(result, Err(ScoreScriptError::Storage(_))) || !conn.is_open();
        let mut idle = self.idle.lock();
        if broken || idle.len() >= self.config.max_idle_connections {
            drop(idle);
            if let Err(e) = conn.close() {
                tracing::warn!(error = %e, "failed to close statistics connection");
            }
        } else {
            idle.push(conn);
        }

        result
    }

    /// Close and discard all idle connections.
    fn release_all(&self) -> Result<()> {
        let connections: Vec<_> = self.idle.lock().drain(..).collect();
        let mut first_error = None;
        for mut conn in connections {
            if let Err(e) = conn.close() {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl TermStatistics for CollectionStatisticsClient {
    fn get(&self, term: &str) -> Result<f64> {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.read().get(term) {
                return Ok(*value);
            }
        }

        let lookup = self.lookup(term)?;
        if self.verbose {
            tracing::debug!(
                term,
                key = %lookup.key,
                fallback = lookup.fallback_used,
                value = lookup.value,
                "resolved collection statistic"
            );
        }

        if let Some(cache) = &self.cache {
            cache.write().insert(term.to_string(), lookup.value);
        }

        Ok(lookup.value)
    }

    fn total_term_frequency(&self) -> Result<Option<f64>> {
        CollectionStatisticsClient::total_term_frequency(self)
    }
}

impl Drop for CollectionStatisticsClient {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            tracing::warn!(error = %e, "failed to release statistics connections");
        }
    }
}
