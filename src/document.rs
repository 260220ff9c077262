//! Per-document statistics accessors.
//!
//! The host engine exposes what scorers need about the document being scored
//! through a small capability set. Each scorer is bounded only on the
//! capabilities it reads, and [`DocumentStatistics`] bundles all four for the
//! object-safe [`Scorer`](crate::scorer::Scorer) API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Term frequencies of the scored field.
pub trait TermFrequencies {
    /// Number of occurrences of `term` in the scored field.
    fn term_frequency(&self, term: &str) -> Result<u32>;
}

/// The precomputed document length.
pub trait DocumentLength {
    /// Value of the document length field, or `None` if the field is absent.
    fn document_length(&self) -> Result<Option<u64>>;
}

/// Distinct terms of the scored field.
pub trait FieldTerms {
    /// The distinct terms present in the field, or `None` if they cannot be
    /// retrieved.
    fn field_terms(&self) -> Result<Option<Vec<String>>>;
}

/// Length of the raw field value.
pub trait RawFieldLength {
    /// Character length of the raw field value, or `None` if the document has
    /// no value for the field.
    fn raw_field_length(&self) -> Result<Option<usize>>;
}

/// The full accessor capability set.
pub trait DocumentStatistics: TermFrequencies + DocumentLength + FieldTerms + RawFieldLength {}

impl<T> DocumentStatistics for T where
    T: TermFrequencies + DocumentLength + FieldTerms + RawFieldLength + ?Sized
{
}

/// Precomputed statistics of one document's scored field.
///
/// This is the accessor used by the batch scorer and the CLI, where documents
/// arrive as JSON records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Document identifier.
    #[serde(default)]
    pub id: String,

    /// Term frequencies of the scored field.
    #[serde(default)]
    pub term_frequencies: BTreeMap<String, u32>,

    /// Value of the document length field.
    #[serde(default)]
    pub length: Option<u64>,

    /// Distinct field terms. Defaults to the keys of `term_frequencies` when
    /// not given explicitly.
    #[serde(default)]
    pub field_terms: Option<Vec<String>>,

    /// Character length of the raw field value.
    #[serde(default)]
    pub raw_field_length: Option<usize>,
}

impl DocumentStats {
    /// Create an empty document with the given identifier.
    pub fn new<S: Into<String>>(id: S) -> Self {
        DocumentStats {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Create a builder for a document.
    pub fn builder<S: Into<String>>(id: S) -> DocumentStatsBuilder {
        DocumentStatsBuilder {
            doc: DocumentStats::new(id),
        }
    }

    /// Get the document identifier.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl TermFrequencies for DocumentStats {
    fn term_frequency(&self, term: &str) -> Result<u32> {
        Ok(self.term_frequencies.get(term).copied().unwrap_or(0))
    }
}

impl DocumentLength for DocumentStats {
    fn document_length(&self) -> Result<Option<u64>> {
        Ok(self.length)
    }
}

impl FieldTerms for DocumentStats {
    fn field_terms(&self) -> Result<Option<Vec<String>>> {
        Ok(Some(match &self.field_terms {
            Some(terms) => terms.clone(),
            None => self
                .term_frequencies
                .iter()
                .filter(|(_, tf)| **tf > 0)
                .map(|(term, _)| term.clone())
                .collect(),
        }))
    }
}

impl RawFieldLength for DocumentStats {
    fn raw_field_length(&self) -> Result<Option<usize>> {
        Ok(self.raw_field_length)
    }
}

/// Builder for [`DocumentStats`].
#[derive(Debug, Clone)]
pub struct DocumentStatsBuilder {
    doc: DocumentStats,
}

impl DocumentStatsBuilder {
    /// Set the frequency of a term.
    pub fn term<S: Into<String>>(mut self, term: S, frequency: u32) -> Self {
        self.doc.term_frequencies.insert(term.into(), frequency);
        self
    }

    /// Set the document length.
    pub fn length(mut self, length: u64) -> Self {
        self.doc.length = Some(length);
        self
    }

    /// Set the distinct field terms explicitly.
    pub fn field_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.doc.field_terms = Some(terms.into_iter().map(Into::into).collect());
        self
    }

    /// Set the raw field length from the raw field text.
    pub fn raw_field(mut self, text: &str) -> Self {
        self.doc.raw_field_length = Some(text.chars().count());
        self
    }

    /// Set the raw field length.
    pub fn raw_field_length(mut self, length: usize) -> Self {
        self.doc.raw_field_length = Some(length);
        self
    }

    /// Build the document.
    pub fn build(self) -> DocumentStats {
        self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_stats_builder() {
        let doc = DocumentStats::builder("doc1")
            .term("cat", 2)
            .term("dog", 1)
            .length(10)
            .raw_field("a cat sat")
            .build();

        assert_eq!(doc.id(), "doc1");
        assert_eq!(doc.term_frequency("cat").unwrap(), 2);
        assert_eq!(doc.term_frequency("bird").unwrap(), 0);
        assert_eq!(doc.document_length().unwrap(), Some(10));
        assert_eq!(doc.raw_field_length().unwrap(), Some(9));
    }

    #[test]
    fn test_field_terms_default_to_matched_terms() {
        let doc = DocumentStats::builder("doc1")
            .term("dog", 1)
            .term("cat", 2)
            .term("ghost", 0)
            .build();

        assert_eq!(
            doc.field_terms().unwrap(),
            Some(vec!["cat".to_string(), "dog".to_string()])
        );

        let doc = DocumentStats::builder("doc2")
            .term("cat", 2)
            .field_terms(["cat", "mat"])
            .build();
        assert_eq!(
            doc.field_terms().unwrap(),
            Some(vec!["cat".to_string(), "mat".to_string()])
        );
    }

    #[test]
    fn test_raw_field_counts_characters() {
        let doc = DocumentStats::builder("doc1").raw_field("naïve").build();
        assert_eq!(doc.raw_field_length().unwrap(), Some(5));
    }

    #[test]
    fn test_deserialize_document_stats() {
        let doc: DocumentStats = serde_json::from_str(
            r#"{"id": "d1", "term_frequencies": {"cat": 3}, "length": 12, "raw_field_length": 40}"#,
        )
        .unwrap();

        assert_eq!(doc.id, "d1");
        assert_eq!(doc.term_frequency("cat").unwrap(), 3);
        assert_eq!(doc.document_length().unwrap(), Some(12));
        assert_eq!(doc.raw_field_length().unwrap(), Some(40));
        assert_eq!(doc.field_terms, None);

        let empty: DocumentStats = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.document_length().unwrap(), None);
    }

    #[test]
    fn test_document_statistics_object() {
        let doc = DocumentStats::builder("doc1").term("cat", 1).length(3).build();
        let view: &dyn DocumentStatistics = &doc;

        assert_eq!(view.term_frequency("cat").unwrap(), 1);
        assert_eq!(view.document_length().unwrap(), Some(3));
    }
}
