//! Okapi BM25 over externally supplied idf values.

use std::sync::Arc;

use tracing::debug;

use crate::document::{DocumentLength, DocumentStatistics, TermFrequencies};
use crate::error::{Result, ScoreScriptError};
use crate::request::{ScorerKind, ScoringRequest};
use crate::scorer::{Scorer, finite_score};
use crate::statistics::TermStatistics;

/// BM25 scorer implementation.
///
/// Terms absent from the document contribute nothing and cost no idf lookup.
/// A document matching no term scores `0.0`.
#[derive(Debug, Clone)]
pub struct BM25Scorer {
    request: Arc<ScoringRequest>,
}

impl BM25Scorer {
    /// Create a new BM25 scorer.
    pub fn new(request: Arc<ScoringRequest>) -> Self {
        debug_assert_eq!(request.kind(), ScorerKind::Bm25);
        BM25Scorer { request }
    }

    /// Get the k1 parameter.
    pub fn k1(&self) -> f64 {
        self.request.k1()
    }

    /// Get the b parameter.
    pub fn b(&self) -> f64 {
        self.request.b()
    }

    /// Calculate the TF (Term Frequency) component.
    fn tf(&self, term_freq: f64, relative_doc_length: f64) -> f64 {
        let k1 = self.k1();
        let b = self.b();
        let norm_factor = 1.0 - b + b * relative_doc_length;

        // TF = (tf * (k1 + 1)) / (tf + k1 * norm_factor)
        (term_freq * (k1 + 1.0)) / (term_freq + k1 * norm_factor)
    }

    /// Score a document.
    pub fn score_document<D, S>(&self, doc: &D, stats: &S) -> Result<f64>
    where
        D: TermFrequencies + DocumentLength + ?Sized,
        S: TermStatistics + ?Sized,
    {
        let request = &self.request;
        let verbose = request.verbose();

        let doc_length = doc
            .document_length()?
            .ok_or_else(|| ScoreScriptError::missing_length_field(request.doc_length_field()))?;
        let relative_doc_length = doc_length as f64 / request.average_doc_length();

        let mut score = 0.0;
        for term in request.terms() {
            let tf = doc.term_frequency(term)?;
            if tf == 0 {
                continue;
            }

            let idf = stats.get(term)?;
            score += idf * self.tf(f64::from(tf), relative_doc_length);

            if verbose {
                debug!(
                    term = term.as_str(),
                    idf,
                    tf,
                    k1 = self.k1(),
                    b = self.b(),
                    doc_length,
                    average_doc_length = request.average_doc_length(),
                    "bm25 term"
                );
            }
        }

        if verbose {
            debug!(score, "bm25 score");
        }
        finite_score(score, ScorerKind::Bm25.script_name())
    }
}

impl Scorer for BM25Scorer {
    fn score(&self, doc: &dyn DocumentStatistics, stats: &dyn TermStatistics) -> Result<f64> {
        self.score_document(doc, stats)
    }

    fn request(&self) -> &ScoringRequest {
        &self.request
    }
}
