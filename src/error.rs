//! Error types for the scorescript library.
//!
//! All errors are represented by the [`ScoreScriptError`] enum. Configuration
//! errors surface once, when a [`ScoringRequest`](crate::request::ScoringRequest)
//! is built; everything else is fatal for the single document being scored.
//!
//! # Examples
//!
//! ```
//! use scorescript::error::{Result, ScoreScriptError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ScoreScriptError::invalid_config("lambda parameter missing"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for scorescript operations.
#[derive(Error, Debug)]
pub enum ScoreScriptError {
    /// I/O errors (statistics files, document files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Missing or malformed scoring parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The document has no value in its length field.
    #[error("Could not compute score, word count field '{field}' missing")]
    MissingLengthField {
        /// Name of the document length field.
        field: String,
    },

    /// The document's field terms could not be retrieved.
    #[error("Could not compute score, unable to retrieve terms of field '{field}'")]
    MissingFieldTerms {
        /// Name of the scored field.
        field: String,
    },

    /// The document length cannot be used as a divisor.
    #[error("Invalid document length {length} in field '{field}'")]
    InvalidDocumentLength {
        /// Name of the document length field.
        field: String,
        /// The offending length.
        length: u64,
    },

    /// Neither the term key nor its fallback key has a stored value.
    #[error("Statistic unavailable: neither '{key}' nor '{fallback_key}' is stored")]
    StatisticsUnavailable {
        /// Key built for the term.
        key: String,
        /// Sentinel key consulted after the term key.
        fallback_key: String,
    },

    /// A stored statistic is not a finite decimal number.
    #[error("Statistic '{key}' has malformed value '{value}'")]
    StatisticsParseError {
        /// Key whose value failed to parse.
        key: String,
        /// The raw stored value.
        value: String,
    },

    /// Accumulation produced NaN or an infinity.
    #[error("Scorer '{scorer}' produced a non-finite score")]
    NonFiniteScore {
        /// Script name of the scorer.
        scorer: &'static str,
    },

    /// Statistics store or connection errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ScoreScriptError.
pub type Result<T> = std::result::Result<T, ScoreScriptError>;

impl ScoreScriptError {
    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        ScoreScriptError::InvalidConfig(msg.into())
    }

    /// Create a new missing length field error.
    pub fn missing_length_field<S: Into<String>>(field: S) -> Self {
        ScoreScriptError::MissingLengthField {
            field: field.into(),
        }
    }

    /// Create a new missing field terms error.
    pub fn missing_field_terms<S: Into<String>>(field: S) -> Self {
        ScoreScriptError::MissingFieldTerms {
            field: field.into(),
        }
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ScoreScriptError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ScoreScriptError::Other(msg.into())
    }

    /// Whether this error was raised while validating parameters.
    pub fn is_config_error(&self) -> bool {
        matches!(self, ScoreScriptError::InvalidConfig(_))
    }
}
