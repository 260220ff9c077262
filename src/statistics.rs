//! Collection-level term statistics.
//!
//! Global per-term statistics (collection-relative term frequency or inverse
//! document frequency) live in an external key-value store under keys of the
//! form `<tag>:<escaped-term>`. Terms with no stored value resolve to a
//! sentinel key (`tf:min_tf`, `idf:max_idf`) so unseen query terms get the
//! least frequent / most informative plausible value.

pub mod client;
pub mod file;
pub mod memory;
pub mod traits;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreScriptError};

pub use self::client::{CollectionStatisticsClient, StatisticLookup};
pub use self::file::FileStatisticsStore;
pub use self::memory::MemoryStatisticsStore;
pub use self::traits::{StatisticsConfig, StatisticsConnection, StatisticsStore};

/// Key holding the collection-wide total term frequency.
pub const TOTAL_TERM_FREQUENCY_KEY: &str = "tf:total_tf";

/// The kind of global statistic a key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    /// Collection-relative term frequency, tag `tf`.
    TermFrequency,
    /// Inverse document frequency, tag `idf`.
    InverseDocumentFrequency,
}

impl StatisticKind {
    /// Tag prefixed to every key of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            StatisticKind::TermFrequency => "tf",
            StatisticKind::InverseDocumentFrequency => "idf",
        }
    }

    /// Sentinel term whose value stands in for unseen terms.
    pub fn fallback_term(&self) -> &'static str {
        match self {
            StatisticKind::TermFrequency => "min_tf",
            StatisticKind::InverseDocumentFrequency => "max_idf",
        }
    }

    /// Build the store key for `term`.
    pub fn key(&self, term: &str) -> String {
        format!("{}:{}", self.tag(), escape_term(term))
    }

    /// The fallback key consulted when a term key is absent.
    pub fn fallback_key(&self) -> String {
        self.key(self.fallback_term())
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for StatisticKind {
    type Err = ScoreScriptError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tf" => Ok(StatisticKind::TermFrequency),
            "idf" => Ok(StatisticKind::InverseDocumentFrequency),
            other => Err(ScoreScriptError::invalid_config(format!(
                "unknown statistic kind '{other}', expected 'tf' or 'idf'"
            ))),
        }
    }
}

/// Escape a term for use inside a store key.
///
/// `:` separates the tag from the term, and `"` is not allowed in keys.
pub fn escape_term(term: &str) -> String {
    term.replace(':', "-").replace('"', "'")
}

/// Parse a stored statistic value.
///
/// Only finite decimal numbers are accepted.
pub fn parse_statistic(key: &str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ScoreScriptError::StatisticsParseError {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Source of collection statistics used by the scorers.
///
/// Implementations must be deterministic: the same term yields the same value
/// for as long as the underlying statistics are unchanged.
pub trait TermStatistics: Send + Sync {
    /// Get the statistic for `term`, applying the fallback for unseen terms.
    fn get(&self, term: &str) -> Result<f64>;

    /// Collection-wide total term frequency, if the source stores one.
    fn total_term_frequency(&self) -> Result<Option<f64>> {
        Ok(None)
    }
}
