//! Classical KL divergence over the query model only.
//!
//! `score(d) = Σ_{t ∈ q, tf(t, d) > 0} P_q(t) · ln(P_q(t) / P_d(t))`
//!
//! No collection smoothing and no interpolation; terms absent from the
//! document are skipped. The sum is the natural score, including `0.0` when
//! nothing matched.

use std::sync::Arc;

use tracing::debug;

use crate::document::{DocumentLength, DocumentStatistics, TermFrequencies};
use crate::error::{Result, ScoreScriptError};
use crate::request::{ScorerKind, ScoringRequest};
use crate::scorer::{Scorer, finite_score};
use crate::statistics::TermStatistics;

/// Query-model-only KL divergence scorer.
#[derive(Debug, Clone)]
pub struct KlQueryModelScorer {
    request: Arc<ScoringRequest>,
}

impl KlQueryModelScorer {
    /// Create a new query-model KL scorer.
    pub fn new(request: Arc<ScoringRequest>) -> Self {
        debug_assert_eq!(request.kind(), ScorerKind::KlQueryModel);
        KlQueryModelScorer { request }
    }

    /// Collection-wide total term frequency from `stats`.
    ///
    /// Not part of the score; available for length normalization diagnostics.
    pub fn total_term_frequency<S>(&self, stats: &S) -> Result<Option<f64>>
    where
        S: TermStatistics + ?Sized,
    {
        stats.total_term_frequency()
    }

    /// Score a document.
    pub fn score_document<D>(&self, doc: &D) -> Result<f64>
    where
        D: TermFrequencies + DocumentLength + ?Sized,
    {
        let request = &self.request;
        let verbose = request.verbose();

        let length = doc
            .document_length()?
            .ok_or_else(|| ScoreScriptError::missing_length_field(request.doc_length_field()))?;
        let l_d = length as f64;

        let mut score = 0.0;
        for (term, &p_q) in request.query_model() {
            let tf = doc.term_frequency(term)?;
            if tf == 0 {
                continue;
            }
            if length == 0 {
                return Err(ScoreScriptError::InvalidDocumentLength {
                    field: request.doc_length_field().to_string(),
                    length,
                });
            }
            // lim p->0 of p ln p is 0
            if p_q <= 0.0 {
                continue;
            }

            let p_d = f64::from(tf) / l_d;
            let kl = p_q * (p_q / p_d).ln();
            score += kl;

            if verbose {
                debug!(term = term.as_str(), tf, p_q, p_d, kl, "kl query model term");
            }
        }

        if verbose {
            debug!(score, "kl query model score");
        }
        finite_score(score, ScorerKind::KlQueryModel.script_name())
    }
}

impl Scorer for KlQueryModelScorer {
    fn score(&self, doc: &dyn DocumentStatistics, _stats: &dyn TermStatistics) -> Result<f64> {
        self.score_document(doc)
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

    fn scorer<const N: usize>(model: [(&str, f64); N]) -> KlQueryModelScorer {
        let params = ScoringParams::new()
            .with_field("body")
            .with_word_count_field("word_count")
            .with_query_model(model);
        let request = ScoringRequest::new(ScorerKind::KlQueryModel, &params).unwrap();
        KlQueryModelScorer::new(Arc::new(request))
    }

    #[test]
    fn test_score_matched_terms_only() {
        let scorer = scorer([("cat", 0.6), ("dog", 0.4)]);
        let doc = DocumentStats::builder("d1").term("cat", 2).term("mat", 8).length(10).build();

        let expected = 0.6 * (0.6f64 / 0.2).ln();
        let score = scorer.score_document(&doc).unwrap();
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_no_match_scores_zero() {
        let scorer = scorer([("cat", 1.0)]);
        let doc = DocumentStats::builder("d1").term("dog", 3).length(3).build();

        assert_eq!(scorer.score_document(&doc).unwrap(), 0.0);
    }

    #[test]
    fn test_does_not_consult_collection_statistics() {
        let scorer = scorer([("cat", 0.5), ("dog", 0.5)]);
        let doc = DocumentStats::builder("d1").term("cat", 1).term("dog", 1).length(4).build();
        let stats = RecordingStatistics::default();

        let score = Scorer::score(&scorer, &doc, &stats).unwrap();
        let expected = 2.0 * 0.5 * (0.5f64 / 0.25).ln();
        assert!((score - expected).abs() < 1e-12);
        assert!(stats.looked_up().is_empty());
    }

    #[test]
    fn test_zero_probability_contributes_nothing() {
        let scorer = scorer([("cat", 0.0), ("dog", 1.0)]);
        let doc = DocumentStats::builder("d1").term("cat", 1).term("dog", 1).length(2).build();

        let expected = (1.0f64 / 0.5).ln();
        assert!((scorer.score_document(&doc).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_missing_length_field() {
        let scorer = scorer([("cat", 1.0)]);
        let doc = DocumentStats::builder("d1").term("cat", 1).build();

        assert!(matches!(
            scorer.score_document(&doc),
            Err(ScoreScriptError::MissingLengthField { .. })
        ));
    }

    #[test]
    fn test_zero_length_with_match_rejected() {
        let scorer = scorer([("cat", 1.0)]);
        let matched = DocumentStats::builder("d1").term("cat", 1).length(0).build();
        let unmatched = DocumentStats::builder("d2").length(0).build();

        assert!(matches!(
            scorer.score_document(&matched),
            Err(ScoreScriptError::InvalidDocumentLength { .. })
        ));
        assert_eq!(scorer.score_document(&unmatched).unwrap(), 0.0);
    }

    #[test]
    fn test_total_term_frequency() {
        let scorer = scorer([("cat", 1.0)]);
        let stats = RecordingStatistics::default();

        assert_eq!(scorer.total_term_frequency(&stats).unwrap(), Some(1000.0));
    }
}
