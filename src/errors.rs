//! Error types for uabench.
//!
//! Per-row problems (a malformed result file, a missing `parsed` record) are
//! not errors at this level: the driver logs and counts them. The variants
//! below cover the failures that abort a whole operation or a whole suite.

use std::path::Path;
use thiserror::Error;

/// The main error type for uabench operations.
#[derive(Debug, Error)]
pub enum UaBenchError {
    /// Configuration-related errors (file parsing, validation, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// An expected-results corpus could not be read or parsed
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// A stored parser result could not be read or parsed
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// A synonym map file could not be loaded
    #[error("Synonym map error: {0}")]
    Synonyms(String),

    /// A requested run, suite or parser does not exist in the result store
    #[error("Not found: {0}")]
    NotFound(String),

    /// File I/O operation failures
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failures
    #[error("Report error: {0}")]
    Report(String),
}

/// A type alias for Results that use UaBenchError.
pub type Result<T> = std::result::Result<T, UaBenchError>;

impl UaBenchError {
    /// Creates a new Corpus error naming the offending file.
    pub fn corpus<S: Into<String>>(path: &Path, msg: S) -> Self {
        UaBenchError::Corpus(format!("{}: {}", path.display(), msg.into()))
    }

    /// Creates a new MalformedResult error naming the offending file.
    pub fn malformed<S: Into<String>>(path: &Path, msg: S) -> Self {
        UaBenchError::MalformedResult(format!("{}: {}", path.display(), msg.into()))
    }

    /// Creates a new Synonyms error naming the offending file.
    pub fn synonyms<S: Into<String>>(path: &Path, msg: S) -> Self {
        UaBenchError::Synonyms(format!("{}: {}", path.display(), msg.into()))
    }

    /// Creates a new NotFound error with context.
    pub fn not_found<S1, S2>(kind: S1, name: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        UaBenchError::NotFound(format!("{} '{}'", kind.into(), name.into()))
    }

    /// Returns true if the error only affects a single stored row.
    pub fn is_row_local(&self) -> bool {
        matches!(self, UaBenchError::MalformedResult(_))
    }

    /// Returns the error category as a string for logging.
    pub fn category(&self) -> &'static str {
        match self {
            UaBenchError::Config(_) => "config",
            UaBenchError::Corpus(_) => "corpus",
            UaBenchError::MalformedResult(_) => "malformed_result",
            UaBenchError::Synonyms(_) => "synonyms",
            UaBenchError::NotFound(_) => "not_found",
            UaBenchError::Io(_) => "io",
            UaBenchError::Report(_) => "report",
        }
    }
}

impl From<config::ConfigError> for UaBenchError {
    fn from(err: config::ConfigError) -> Self {
        UaBenchError::Config(anyhow::Error::from(err))
    }
}

impl From<serde_json::Error> for UaBenchError {
    fn from(err: serde_json::Error) -> Self {
        UaBenchError::Report(err.to_string())
    }
}
