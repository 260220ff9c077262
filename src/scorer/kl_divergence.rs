//! Kullback-Leibler divergence over the query and document vocabulary.
//!
//! Both the query model and the document model are interpolated with the
//! collection model:
//!
//! `score(d) = Σ_{t ∈ V} ((1 - λ) P_c(t) + λ P_q(t)) · ln((1 - λ) P_c(t) + λ P_d(t))`
//!
//! where `V` is the union of the query-model terms and the document's field
//! terms.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::document::{
    DocumentLength, DocumentStatistics, FieldTerms, RawFieldLength, TermFrequencies,
};
use crate::error::{Result, ScoreScriptError};
use crate::request::{ScorerKind, ScoringRequest};
use crate::scorer::{Scorer, exceeds_max_field_length, finite_score};
use crate::statistics::TermStatistics;

/// Score returned when the raw field exceeds the length guard.
pub const KL_OVER_LENGTH_SCORE: f64 = -1000.0;

/// Score returned when no vocabulary term occurs in the document.
pub const KL_NO_MATCH_SCORE: f64 = -1000.0;

/// Vocabulary-union KL divergence scorer with collection smoothing.
#[derive(Debug, Clone)]
pub struct KlDivergenceScorer {
    request: Arc<ScoringRequest>,
}

impl KlDivergenceScorer {
    /// Create a new KL divergence scorer.
    pub fn new(request: Arc<ScoringRequest>) -> Self {
        debug_assert_eq!(request.kind(), ScorerKind::KlDivergence);
        KlDivergenceScorer { request }
    }

    /// The scored vocabulary for a document: query-model terms plus field terms.
    pub fn vocabulary<D>(&self, doc: &D) -> Result<BTreeSet<String>>
    where
        D: FieldTerms + ?Sized,
    {
        let field_terms = doc
            .field_terms()?
            .ok_or_else(|| ScoreScriptError::missing_field_terms(self.request.field()))?;

        let mut vocabulary: BTreeSet<String> = self.request.query_model().keys().cloned().collect();
        vocabulary.extend(field_terms);
        Ok(vocabulary)
    }

    /// Score a document.
    pub fn score_document<D, S>(&self, doc: &D, stats: &S) -> Result<f64>
    where
        D: TermFrequencies + DocumentLength + FieldTerms + RawFieldLength + ?Sized,
        S: TermStatistics + ?Sized,
    {
        let request = &self.request;
        let verbose = request.verbose();

        if exceeds_max_field_length(request, doc)? {
            if verbose {
                debug!(field = request.field(), "field too long");
            }
            return Ok(KL_OVER_LENGTH_SCORE);
        }

        let length = doc
            .document_length()?
            .ok_or_else(|| ScoreScriptError::missing_length_field(request.doc_length_field()))?;
        let vocabulary = self.vocabulary(doc)?;
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
        for term in &vocabulary {
            let tf = doc.term_frequency(term)?;
            at_least_one |= tf > 0;

            let p_q = request.query_model().get(term).copied().unwrap_or(0.0);
            let p_d = f64::from(tf) / l_d;
            let p_c = stats.get(term)?;
            let kl = ((1.0 - lambda) * p_c + lambda * p_q) * ((1.0 - lambda) * p_c + lambda * p_d).ln();
            score += kl;

            if verbose {
                debug!(term = term.as_str(), tf, p_q, p_d, p_c, kl, "kl divergence term");
            }
        }

        if !at_least_one {
            if verbose {
                debug!(score, "no vocabulary term matched");
            }
            return Ok(KL_NO_MATCH_SCORE);
        }

        if verbose {
            debug!(score, "kl divergence score");
        }
        finite_score(score, ScorerKind::KlDivergence.script_name())
    }
}

impl Scorer for KlDivergenceScorer {
    fn score(&self, doc: &dyn DocumentStatistics, stats: &dyn TermStatistics) -> Result<f64> {
        self.score_document(doc, stats)
    }

    fn request(&self) -> &ScoringRequest {
        &self.request
    }
}
