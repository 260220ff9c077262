//! Scoring parameters and the validated per-query request.
//!
//! Hosts hand scorers a loosely typed parameter map once per query.
//! [`ScoringParams`] mirrors that map, and [`ScoringRequest::new`] validates it
//! for one [`ScorerKind`], producing an immutable request shared read-only by
//! every document scored in the query.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, ScoreScriptError};
use crate::statistics::StatisticKind;

/// Default BM25 `k1`.
pub const DEFAULT_K1: f64 = 1.2;

/// Default BM25 `b`.
pub const DEFAULT_B: f64 = 0.75;

/// The scoring models available to a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScorerKind {
    /// Linearly interpolated query likelihood.
    QueryLikelihood,
    /// Okapi BM25 with externally supplied idf.
    Bm25,
    /// KL divergence over the query and document vocabulary union.
    KlDivergence,
    /// Classical KL divergence over the query model only.
    KlQueryModel,
}

impl ScorerKind {
    /// All scorer kinds.
    pub const ALL: [ScorerKind; 4] = [
        ScorerKind::QueryLikelihood,
        ScorerKind::Bm25,
        ScorerKind::KlDivergence,
        ScorerKind::KlQueryModel,
    ];

    /// The name the scorer is registered under in a host engine.
    pub fn script_name(&self) -> &'static str {
        match self {
            ScorerKind::QueryLikelihood => "qle_model_script_score",
            ScorerKind::Bm25 => "temp_sum_bm25_script_score",
            ScorerKind::KlDivergence => "kullback_leibler_script_score",
            ScorerKind::KlQueryModel => "kullback_leibler_query_model_score",
        }
    }

    /// Short alias accepted on the command line.
    pub fn alias(&self) -> &'static str {
        match self {
            ScorerKind::QueryLikelihood => "ql",
            ScorerKind::Bm25 => "bm25",
            ScorerKind::KlDivergence => "kl",
            ScorerKind::KlQueryModel => "kl-query",
        }
    }

    /// The collection statistic the scorer reads.
    pub fn statistic_kind(&self) -> StatisticKind {
        match self {
            ScorerKind::Bm25 => StatisticKind::InverseDocumentFrequency,
            _ => StatisticKind::TermFrequency,
        }
    }

    fn uses_terms(&self) -> bool {
        matches!(self, ScorerKind::QueryLikelihood | ScorerKind::Bm25)
    }

    fn requires_lambda(&self) -> bool {
        matches!(self, ScorerKind::QueryLikelihood | ScorerKind::KlDivergence)
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.script_name())
    }
}

impl FromStr for ScorerKind {
    type Err = ScoreScriptError;

    fn from_str(s: &str) -> Result<Self> {
        ScorerKind::ALL
            .into_iter()
            .find(|kind| kind.script_name() == s || kind.alias() == s)
            .ok_or_else(|| ScoreScriptError::invalid_config(format!("unknown scorer '{s}'")))
    }
}

/// Raw scoring parameters, keyed as the host passes them.
///
/// Every field is optional here; which ones are required depends on the
/// scorer and is checked by [`ScoringRequest::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    /// Field providing term occurrences.
    pub field: Option<String>,
    /// Terms to score (query likelihood, BM25).
    pub terms: Option<Vec<String>>,
    /// Query term probabilities (KL variants).
    pub query_model: Option<BTreeMap<String, f64>>,
    /// Field holding the document length.
    pub word_count_field: Option<String>,
    /// Average document length (BM25).
    pub word_count_average: Option<f64>,
    /// Interpolation weight.
    pub lambda: Option<f64>,
    /// Raw field length guard; zero or negative disables it.
    pub max_field_length: Option<i64>,
    /// BM25 length normalization.
    pub b: Option<f64>,
    /// BM25 term frequency saturation.
    pub k1: Option<f64>,
    /// Diagnostic tracing.
    pub verbose: Option<bool>,
}

impl ScoringParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse parameters from a JSON object.
    ///
    /// Unknown keys are ignored; keys of the wrong type are configuration
    /// errors.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(ScoreScriptError::invalid_config(
                "scoring parameters must be a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| ScoreScriptError::invalid_config(format!("malformed parameter: {e}")))
    }

    /// Parse parameters from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ScoreScriptError::invalid_config(format!("malformed parameters: {e}")))?;
        Self::from_value(value)
    }

    /// Set the scored field.
    pub fn with_field<S: Into<String>>(mut self, field: S) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the query terms.
    pub fn with_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.terms = Some(terms.into_iter().map(Into::into).collect());
        self
    }

    /// Set the query model.
    pub fn with_query_model<I, S>(mut self, model: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.query_model = Some(model.into_iter().map(|(t, p)| (t.into(), p)).collect());
        self
    }

    /// Set the document length field.
    pub fn with_word_count_field<S: Into<String>>(mut self, field: S) -> Self {
        self.word_count_field = Some(field.into());
        self
    }

    /// Set the average document length.
    pub fn with_word_count_average(mut self, average: f64) -> Self {
        self.word_count_average = Some(average);
        self
    }

    /// Set the interpolation weight.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = Some(lambda);
        self
    }

    /// Set the raw field length guard.
    pub fn with_max_field_length(mut self, max_field_length: i64) -> Self {
        self.max_field_length = Some(max_field_length);
        self
    }

    /// Set the BM25 parameters.
    pub fn with_bm25(mut self, k1: f64, b: f64) -> Self {
        self.k1 = Some(k1);
        self.b = Some(b);
        self
    }

    /// Enable diagnostic tracing.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }
}

/// A validated, immutable scoring request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringRequest {
    kind: ScorerKind,
    field: String,
    doc_length_field: String,
    terms: Vec<String>,
    query_model: BTreeMap<String, f64>,
    lambda: f64,
    max_field_length: Option<usize>,
    k1: f64,
    b: f64,
    average_doc_length: f64,
    verbose: bool,
}

impl ScoringRequest {
    /// Validate `params` for `kind`.
    pub fn new(kind: ScorerKind, params: &ScoringParams) -> Result<Self> {
        let missing = |name: &str| {
            ScoreScriptError::invalid_config(format!(
                "cannot initialize {}: parameter '{name}' missing",
                kind.script_name()
            ))
        };
        let invalid = |name: &str, reason: String| {
            ScoreScriptError::invalid_config(format!(
                "cannot initialize {}: parameter '{name}' {reason}",
                kind.script_name()
            ))
        };

        let field = required_name(params.field.as_deref(), "field", &missing, &invalid)?;
        let doc_length_field = required_name(
            params.word_count_field.as_deref(),
            "word_count_field",
            &missing,
            &invalid,
        )?;

        let terms = if kind.uses_terms() {
            params.terms.clone().ok_or_else(|| missing("terms"))?
        } else {
            Vec::new()
        };

        let query_model = if kind.uses_terms() {
            BTreeMap::new()
        } else {
            let model = params
                .query_model
                .clone()
                .ok_or_else(|| missing("query_model"))?;
            if let Some((term, p)) = model.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
                return Err(invalid(
                    "query_model",
                    format!("has invalid probability {p} for term '{term}'"),
                ));
            }
            model
        };

        let lambda = match params.lambda {
            Some(lambda) if !lambda.is_finite() || !(0.0..=1.0).contains(&lambda) => {
                return Err(invalid("lambda", format!("must be within [0, 1], got {lambda}")));
            }
            Some(lambda) => lambda,
            None if kind.requires_lambda() => return Err(missing("lambda")),
            None => 0.0,
        };

        let (k1, b, average_doc_length) = if kind == ScorerKind::Bm25 {
            let average = params
                .word_count_average
                .ok_or_else(|| missing("word_count_average"))?;
            if !average.is_finite() || average <= 0.0 {
                return Err(invalid(
                    "word_count_average",
                    format!("must be positive, got {average}"),
                ));
            }
            let k1 = params.k1.unwrap_or(DEFAULT_K1);
            if !k1.is_finite() || k1 < 0.0 {
                return Err(invalid("k1", format!("must be non-negative, got {k1}")));
            }
            let b = params.b.unwrap_or(DEFAULT_B);
            if !b.is_finite() || !(0.0..=1.0).contains(&b) {
                return Err(invalid("b", format!("must be within [0, 1], got {b}")));
            }
            (k1, b, average)
        } else {
            (
                params.k1.unwrap_or(DEFAULT_K1),
                params.b.unwrap_or(DEFAULT_B),
                params.word_count_average.unwrap_or(0.0),
            )
        };

        let max_field_length = params
            .max_field_length
            .filter(|max| *max > 0)
            .map(|max| max as usize);

        Ok(ScoringRequest {
            kind,
            field: field.to_string(),
            doc_length_field: doc_length_field.to_string(),
            terms,
            query_model,
            lambda,
            max_field_length,
            k1,
            b,
            average_doc_length,
            verbose: params.verbose.unwrap_or(false),
        })
    }

    /// Parse and validate a JSON parameter object.
    pub fn from_json_str(kind: ScorerKind, json: &str) -> Result<Self> {
        Self::new(kind, &ScoringParams::from_json_str(json)?)
    }

    /// The scorer this request was validated for.
    pub fn kind(&self) -> ScorerKind {
        self.kind
    }

    /// The field holding scored terms.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The field holding the precomputed document length.
    pub fn doc_length_field(&self) -> &str {
        &self.doc_length_field
    }

    /// Query terms in order, duplicates included.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Query model probabilities in term order.
    pub fn query_model(&self) -> &BTreeMap<String, f64> {
        &self.query_model
    }

    /// Interpolation weight between collection and document models.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Raw field length guard, if enabled.
    pub fn max_field_length(&self) -> Option<usize> {
        self.max_field_length
    }

    /// BM25 `k1`.
    pub fn k1(&self) -> f64 {
        self.k1
    }

    /// BM25 `b`.
    pub fn b(&self) -> f64 {
        self.b
    }

    /// Average document length (BM25).
    pub fn average_doc_length(&self) -> f64 {
        self.average_doc_length
    }

    /// Whether diagnostic tracing is enabled.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

fn required_name<'a>(
    value: Option<&'a str>,
    name: &str,
    missing: &dyn Fn(&str) -> ScoreScriptError,
    invalid: &dyn Fn(&str, String) -> ScoreScriptError,
) -> Result<&'a str> {
    match value {
        None => Err(missing(name)),
        Some(v) if v.trim().is_empty() => Err(invalid(name, "must not be empty".to_string())),
        Some(v) => Ok(v),
    }
}
