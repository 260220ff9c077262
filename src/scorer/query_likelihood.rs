//! Query likelihood with linear interpolation (Jelinek-Mercer smoothing).
//!
//! `score(d) = Σ_t ln((1 - λ) · M_c(t) + λ · tf(t, d) / L_d)`, summed in the
//! log domain to avoid underflow.

use std::sync::Arc;

use tracing::debug;

use crate::document::{DocumentLength, DocumentStatistics, RawFieldLength, TermFrequencies};
use crate::error::{Result, ScoreScriptError};
use crate::request::{ScorerKind, ScoringRequest};
use crate::scorer::{Scorer, exceeds_max_field_length, finite_score};
use crate::statistics::TermStatistics;

/// Score returned when the raw field exceeds the length guard.
pub const QL_OVER_LENGTH_SCORE: f64 = -100.0;

/// Score returned when no query term occurs in the document.
pub const QL_NO_MATCH_SCORE: f64 = -10000.0;

/// Query likelihood scorer.
#[derive(Debug, Clone)]
pub struct QueryLikelihoodScorer {
    request: Arc<ScoringRequest>,
}

impl QueryLikelihoodScorer {
    /// Create a new query likelihood scorer.
    pub fn new(request: Arc<ScoringRequest>) -> Self {
        debug_assert_eq!(request.kind(), ScorerKind::QueryLikelihood);
        QueryLikelihoodScorer { request }
    }

    /// Score a document.
    pub fn score_document<D, S>(&self, doc: &D, stats: &S) -> Result<f64>
    where
        D: TermFrequencies + DocumentLength + RawFieldLength + ?Sized,
        S: TermStatistics + ?Sized,
    {
        let request = &self.request;
        let verbose = request.verbose();

        if exceeds_max_field_length(request, doc)? {
            if verbose {
                debug!(field = request.field(), "field too long");
            }
            return Ok(QL_OVER_LENGTH_SCORE);
        }

        let length = doc
            .document_length()?
            .ok_or_else(|| ScoreScriptError::missing_length_field(request.doc_length_field()))?;
        if length == 0 {
            return Err(ScoreScriptError::InvalidDocumentLength {
                field: request.doc_length_field().to_string(),
                length,
            });
        }
        let l_d = length as f64;
        let lambda = request.lambda();

        let mut score = 0.0;
        let mut at_least_one = false;
        for term in request.terms() {
            let m_c = stats.get(term)?;
            let tf = doc.term_frequency(term)?;
            at_least_one |= tf > 0;

            let m_d = f64::from(tf) / l_d;
            score += ((1.0 - lambda) * m_c + lambda * m_d).ln();

            if verbose {
                debug!(term = term.as_str(), tf, l_d, m_c, m_d, score, "query likelihood term");
            }
        }

        if !at_least_one || score == 0.0 {
            if verbose {
                debug!(score, "no query term matched");
            }
            return Ok(QL_NO_MATCH_SCORE);
        }

        if verbose {
            debug!(score, "query likelihood score");
        }
        finite_score(score, ScorerKind::QueryLikelihood.script_name())
    }
}

impl Scorer for QueryLikelihoodScorer {
    fn score(&self, doc: &dyn DocumentStatistics, stats: &dyn TermStatistics) -> Result<f64> {
        self.score_document(doc, stats)
    }

    fn request(&self) -> &ScoringRequest {
        &self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStats;
    use crate::request::ScoringParams;
    use crate::scorer::test_support::RecordingStatistics;

    fn scorer(params: ScoringParams) -> QueryLikelihoodScorer {
        let request = ScoringRequest::new(ScorerKind::QueryLikelihood, &params).unwrap();
        QueryLikelihoodScorer::new(Arc::new(request))
    }

    fn params<const N: usize>(terms: [&str; N], lambda: f64) -> ScoringParams {
        ScoringParams::new()
            .with_field("body")
            .with_word_count_field("word_count")
            .with_terms(terms)
            .with_lambda(lambda)
    }

    #[test]
    fn test_cat_dog_scenario() {
        let scorer = scorer(params(["cat", "dog"], 0.5));
        let doc = DocumentStats::builder("d1")
            .term("cat", 2)
            .term("dog", 0)
            .length(10)
            .build();
        let stats = RecordingStatistics::new([("cat", 0.01), ("dog", 0.02)]);

        let score = scorer.score_document(&doc, &stats).unwrap();
        let expected = (0.5f64 * 0.01 + 0.5 * 0.2).ln() + (0.5f64 * 0.02 + 0.5 * 0.0).ln();

        assert!((score - expected).abs() < 1e-12);
        assert!((score - (-6.859)).abs() < 1e-3);
    }

    #[test]
    fn test_duplicate_terms_counted_per_occurrence() {
        let scorer_once = scorer(params(["cat"], 0.5));
        let scorer_twice = scorer(params(["cat", "cat"], 0.5));
        let doc = DocumentStats::builder("d1").term("cat", 2).length(10).build();
        let stats = RecordingStatistics::new([("cat", 0.01)]);

        let once = scorer_once.score_document(&doc, &stats).unwrap();
        let twice = scorer_twice.score_document(&doc, &stats).unwrap();

        assert!((twice - 2.0 * once).abs() < 1e-12);
        assert_eq!(stats.looked_up(), vec!["cat", "cat", "cat"]);
    }

    #[test]
    fn test_no_match_returns_sentinel() {
        let scorer = scorer(params(["cat", "dog"], 0.5));
        let doc = DocumentStats::builder("d1").term("bird", 4).length(10).build();
        let stats = RecordingStatistics::new([("cat", 0.01), ("dog", 0.02)]);

        assert_eq!(scorer.score_document(&doc, &stats).unwrap(), QL_NO_MATCH_SCORE);
    }

    #[test]
    fn test_empty_terms_returns_sentinel() {
        let scorer = scorer(params([], 0.5));
        let doc = DocumentStats::builder("d1").term("cat", 1).length(10).build();
        let stats = RecordingStatistics::default();

        assert_eq!(scorer.score_document(&doc, &stats).unwrap(), QL_NO_MATCH_SCORE);
    }

    #[test]
    fn test_zero_score_returns_sentinel() {
        // ln(1) == 0 exactly: every token of the document is the query term.
        let scorer = scorer(params(["cat"], 1.0));
        let doc = DocumentStats::builder("d1").term("cat", 5).length(5).build();
        let stats = RecordingStatistics::new([("cat", 0.3)]);

        assert_eq!(scorer.score_document(&doc, &stats).unwrap(), QL_NO_MATCH_SCORE);
    }

    #[test]
    fn test_over_length_skips_everything() {
        let scorer = scorer(params(["cat"], 0.5).with_max_field_length(10));
        let doc = DocumentStats::builder("d1")
            .term("cat", 1)
            .raw_field_length(15)
            .build();
        let stats = RecordingStatistics::default();

        assert_eq!(scorer.score_document(&doc, &stats).unwrap(), QL_OVER_LENGTH_SCORE);
        assert!(stats.looked_up().is_empty());
    }

    #[test]
    fn test_within_length_is_scored() {
        let scorer = scorer(params(["cat"], 0.5).with_max_field_length(10));
        let doc = DocumentStats::builder("d1")
            .term("cat", 1)
            .length(2)
            .raw_field_length(10)
            .build();
        let stats = RecordingStatistics::new([("cat", 0.01)]);

        let score = scorer.score_document(&doc, &stats).unwrap();
        assert!((score - (0.5f64 * 0.01 + 0.5 * 0.5).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_length_field() {
        let scorer = scorer(params(["cat"], 0.5));
        let doc = DocumentStats::builder("d1").term("cat", 1).build();
        let stats = RecordingStatistics::new([("cat", 0.01)]);

        match scorer.score_document(&doc, &stats) {
            Err(ScoreScriptError::MissingLengthField { field }) => assert_eq!(field, "word_count"),
            other => panic!("expected missing length field, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        let scorer = scorer(params(["cat"], 0.5));
        let doc = DocumentStats::builder("d1").length(0).build();
        let stats = RecordingStatistics::new([("cat", 0.01)]);

        assert!(matches!(
            scorer.score_document(&doc, &stats),
            Err(ScoreScriptError::InvalidDocumentLength { length: 0, .. })
        ));
    }

    #[test]
    fn test_unseen_term_uses_fallback_value() {
        let scorer = scorer(params(["cat", "unseen"], 0.5));
        let doc = DocumentStats::builder("d1").term("cat", 2).length(10).build();
        let stats = RecordingStatistics::new([("cat", 0.01)]).with_fallback(0.0001);

        let score = scorer.score_document(&doc, &stats).unwrap();
        let expected = (0.5f64 * 0.01 + 0.5 * 0.2).ln() + (0.5f64 * 0.0001).ln();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_statistics_error_propagates() {
        let scorer = scorer(params(["cat", "dog"], 0.5));
        let doc = DocumentStats::builder("d1").term("cat", 2).length(10).build();
        let stats = RecordingStatistics::new([("cat", 0.01)]);

        assert!(matches!(
            scorer.score_document(&doc, &stats),
            Err(ScoreScriptError::StatisticsUnavailable { .. })
        ));
    }

    #[test]
    fn test_unsmoothed_miss_is_non_finite() {
        // With lambda = 1 an absent term contributes ln(0).
        let scorer = scorer(params(["cat", "dog"], 1.0));
        let doc = DocumentStats::builder("d1").term("cat", 2).length(10).build();
        let stats = RecordingStatistics::new([("cat", 0.01), ("dog", 0.02)]);

        assert!(matches!(
            scorer.score_document(&doc, &stats),
            Err(ScoreScriptError::NonFiniteScore { .. })
        ));
    }

    #[test]
    fn test_verbose_does_not_change_score() {
        let doc = DocumentStats::builder("d1").term("cat", 3).length(17).build();
        let stats = RecordingStatistics::new([("cat", 0.01), ("dog", 0.02)]);

        let quiet = scorer(params(["cat", "dog"], 0.4));
        let verbose = scorer(params(["cat", "dog"], 0.4).with_verbose(true));

        let a = quiet.score_document(&doc, &stats).unwrap();
        let b = verbose.score_document(&doc, &stats).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
