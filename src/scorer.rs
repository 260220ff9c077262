//! Scoring implementations for ranking documents.
//!
//! Every scorer is a pure function of a [`ScoringRequest`], the statistics of
//! one document and a source of collection statistics. Scorers hold the
//! request behind an [`Arc`] and can be shared across scoring threads.

pub mod bm25;
pub mod kl_divergence;
pub mod kl_query_model;
pub mod query_likelihood;

use std::fmt::Debug;
use std::sync::Arc;

use crate::document::{DocumentStatistics, RawFieldLength};
use crate::error::{Result, ScoreScriptError};
use crate::request::ScoringRequest;
use crate::statistics::TermStatistics;

pub use self::bm25::BM25Scorer;
pub use self::kl_divergence::{KL_NO_MATCH_SCORE, KL_OVER_LENGTH_SCORE, KlDivergenceScorer};
pub use self::kl_query_model::KlQueryModelScorer;
pub use self::query_likelihood::{QL_NO_MATCH_SCORE, QL_OVER_LENGTH_SCORE, QueryLikelihoodScorer};
pub use crate::request::ScorerKind;

/// Trait for document scorers.
pub trait Scorer: Send + Sync + Debug {
    /// Score one document.
    fn score(&self, doc: &dyn DocumentStatistics, stats: &dyn TermStatistics) -> Result<f64>;

    /// The request this scorer was built from.
    fn request(&self) -> &ScoringRequest;

    /// Get the script name of this scorer.
    fn name(&self) -> &'static str {
        self.request().kind().script_name()
    }
}

/// Create the scorer selected by the request's kind.
pub fn create_scorer(request: Arc<ScoringRequest>) -> Box<dyn Scorer> {
    match request.kind() {
        ScorerKind::QueryLikelihood => Box::new(QueryLikelihoodScorer::new(request)),
        ScorerKind::Bm25 => Box::new(BM25Scorer::new(request)),
        ScorerKind::KlDivergence => Box::new(KlDivergenceScorer::new(request)),
        ScorerKind::KlQueryModel => Box::new(KlQueryModelScorer::new(request)),
    }
}

/// Whether the raw field exceeds the request's length guard.
///
/// A document without a raw field value never trips the guard.
pub(crate) fn exceeds_max_field_length<D>(request: &ScoringRequest, doc: &D) -> Result<bool>
where
    D: RawFieldLength + ?Sized,
{
    let Some(max) = request.max_field_length() else {
        return Ok(false);
    };

    Ok(doc
        .raw_field_length()?
        .is_some_and(|length| length > max))
}

/// Reject non-finite accumulated scores.
pub(crate) fn finite_score(score: f64, scorer: &'static str) -> Result<f64> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(ScoreScriptError::NonFiniteScore { scorer })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ahash::AHashMap;
    use parking_lot::Mutex;

    use crate::error::{Result, ScoreScriptError};
    use crate::statistics::TermStatistics;

    /// Term statistics from a fixed table, recording every lookup.
    #[derive(Debug, Default)]
    pub struct RecordingStatistics {
        values: AHashMap<String, f64>,
        fallback: Option<f64>,
        pub lookups: Mutex<Vec<String>>,
    }

    impl RecordingStatistics {
        pub fn new<'a>(values: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
            RecordingStatistics {
                values: values.into_iter().map(|(t, v)| (t.to_string(), v)).collect(),
                fallback: None,
                lookups: Mutex::new(Vec::new()),
            }
        }

        pub fn with_fallback(mut self, fallback: f64) -> Self {
            self.fallback = Some(fallback);
            self
        }

        pub fn looked_up(&self) -> Vec<String> {
            self.lookups.lock().clone()
        }
    }

    impl TermStatistics for RecordingStatistics {
        fn get(&self, term: &str) -> Result<f64> {
            self.lookups.lock().push(term.to_string());
            self.values
                .get(term)
                .copied()
                .or(self.fallback)
                .ok_or_else(|| ScoreScriptError::StatisticsUnavailable {
                    key: format!("tf:{term}"),
                    fallback_key: "tf:min_tf".to_string(),
                })
        }

        fn total_term_frequency(&self) -> Result<Option<f64>> {
            Ok(Some(1000.0))
        }
    }
}
