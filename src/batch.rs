//! Parallel scoring of many documents against one request.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::document::DocumentStats;
use crate::error::{Result, ScoreScriptError};
use crate::scorer::Scorer;
use crate::statistics::TermStatistics;

/// Configuration for batch scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Thread pool size. If None, uses the number of CPU cores.
    pub num_threads: Option<usize>,

    /// Maximum number of ranked documents returned.
    pub max_results: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            max_results: 100,
        }
    }
}

impl BatchConfig {
    /// Set the thread pool size.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set the maximum number of ranked results.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// A successfully scored document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// The document identifier.
    pub id: String,
    /// The relevance score.
    pub score: f64,
}

/// The outcome of scoring one document.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// The document identifier.
    pub id: String,
    /// The score, or the error that was fatal for this document.
    pub result: Result<f64>,
}

/// Outcomes of a batch, in input order.
#[derive(Debug)]
pub struct BatchResult {
    /// Per-document outcomes.
    pub outcomes: Vec<DocumentOutcome>,
    /// Wall time spent scoring.
    pub elapsed: Duration,
}

impl BatchResult {
    /// Successfully scored documents, best first.
    ///
    /// Ties are broken by document identifier so the ranking is stable.
    pub fn rank(&self, limit: usize) -> Vec<ScoredDocument> {
        let mut scored: Vec<ScoredDocument> = self
            .outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(score) => Some(ScoredDocument {
                    id: outcome.id.clone(),
                    score: *score,
                }),
                Err(_) => None,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(limit);
        scored
    }

    /// Documents whose scoring failed.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ScoreScriptError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                Ok(_) => None,
                Err(e) => Some((outcome.id.as_str(), e)),
            })
    }

    /// Number of successfully scored documents.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Scores batches of documents on a dedicated thread pool.
#[derive(Debug)]
pub struct BatchScorer {
    /// The scorer shared by every worker.
    scorer: Arc<dyn Scorer>,
    /// Thread pool for parallel execution.
    thread_pool: Arc<ThreadPool>,
    /// Batch configuration.
    config: BatchConfig,
}

impl BatchScorer {
    /// Create a new batch scorer.
    pub fn new(scorer: Arc<dyn Scorer>, config: BatchConfig) -> Result<Self> {
        let num_threads = config.num_threads.unwrap_or_else(num_cpus::get);

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("batch-scorer-{i}"))
            .build()
            .map_err(|e| ScoreScriptError::other(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            scorer,
            thread_pool: Arc::new(thread_pool),
            config,
        })
    }

    /// Get the batch configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Get the scorer.
    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    /// Score every document.
    ///
    /// A failing document never affects the others.
    pub fn score_all(&self, documents: &[DocumentStats], stats: &dyn TermStatistics) -> BatchResult {
        let start = Instant::now();
        let scorer = self.scorer.as_ref();

        let outcomes = self.thread_pool.install(|| {
            documents
                .par_iter()
                .map(|doc| DocumentOutcome {
                    id: doc.id.clone(),
                    result: scorer.score(doc, stats),
                })
                .collect::<Vec<_>>()
        });

        let result = BatchResult {
            outcomes,
            elapsed: start.elapsed(),
        };

        tracing::debug!(
            scorer = scorer.name(),
            documents = documents.len(),
            scored = result.success_count(),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "scored batch"
        );

        result
    }

    /// Score every document and return the configured number of best hits.
    pub fn top_documents(
        &self,
        documents: &[DocumentStats],
        stats: &dyn TermStatistics,
    ) -> Vec<ScoredDocument> {
        self.score_all(documents, stats).rank(self.config.max_results)
    }
}
