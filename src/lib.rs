//! # scorescript
//!
//! Relevance scoring kernels for documents whose term statistics come from a
//! search engine and whose collection statistics live in an external
//! key-value store.
//!
//! ## Features
//!
//! - Query likelihood with linear interpolation
//! - Okapi BM25 with externally supplied idf
//! - Kullback-Leibler divergence, vocabulary-union and query-model-only
//! - Collection statistics lookup with fallback keys and pooled connections
//! - Parallel batch scoring
//!
//! ```
//! use std::sync::Arc;
//!
//! use scorescript::prelude::*;
//!
//! let params = ScoringParams::new()
//!     .with_field("body")
//!     .with_word_count_field("word_count")
//!     .with_terms(["cat", "dog"])
//!     .with_lambda(0.5);
//! let request = Arc::new(ScoringRequest::new(ScorerKind::QueryLikelihood, &params)?);
//!
//! let store = MemoryStatisticsStore::from_pairs([("tf:cat", "0.01"), ("tf:dog", "0.02")]);
//! let stats = CollectionStatisticsClient::open(
//!     Arc::new(store),
//!     StatisticKind::TermFrequency,
//!     StatisticsConfig::default(),
//! )?;
//!
//! let doc = DocumentStats::builder("doc1").term("cat", 2).length(10).build();
//! let score = create_scorer(request).score(&doc, &stats)?;
//! assert!((score - (0.105f64.ln() + 0.01f64.ln())).abs() < 1e-9);
//! # Ok::<(), scorescript::error::ScoreScriptError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod document;
pub mod error;
pub mod request;
pub mod scorer;
pub mod statistics;

pub mod prelude {
    pub use crate::batch::{BatchConfig, BatchScorer, ScoredDocument};
    pub use crate::document::{DocumentStatistics, DocumentStats};
    pub use crate::error::{Result, ScoreScriptError};
    pub use crate::request::{ScorerKind, ScoringParams, ScoringRequest};
    pub use crate::scorer::{Scorer, create_scorer};
    pub use crate::statistics::{
        CollectionStatisticsClient, FileStatisticsStore, MemoryStatisticsStore, StatisticKind,
        StatisticsConfig, StatisticsStore, TermStatistics,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
