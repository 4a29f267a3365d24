//! Error types for the morphological segmentation library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the segmentation library.
#[derive(Error, Debug)]
pub enum MorphError {
    /// Malformed corpus or segmentation line
    #[error("Corpus format error at line {line}: {reason}")]
    CorpusFormat { line: usize, reason: String },

    /// No segmentation reaches the end of the compound
    #[error("Segmentation error for '{compound}': {reason}")]
    Segmentation { compound: String, reason: String },

    /// Inconsistent or non-finite cost accounting
    #[error("Cost model error: {0}")]
    CostModel(String),

    /// Construction that cannot be built or split as requested
    #[error("Invalid construction: {0}")]
    InvalidConstruction(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation needs training state that a segment-only model dropped
    #[error("Model is segment-only: {0}")]
    SegmentOnly(String),

    /// Error loading a model or segmentation file
    #[error("Load error: {0}")]
    Load(String),

    /// Error saving a model or segmentation file
    #[error("Save error: {0}")]
    Save(String),

    /// I/O error with file context
    #[error("I/O error for {path}: {err}")]
    Io {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MorphError {
    /// Shorthand for a corpus error on a 1-based line number.
    pub fn corpus(line: usize, reason: impl Into<String>) -> Self {
        Self::CorpusFormat {
            line,
            reason: reason.into(),
        }
    }

    /// Shorthand for an I/O error on `path`.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }
}

/// Result type alias for segmentation operations.
pub type Result<T> = std::result::Result<T, MorphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_error_display() {
        let err = MorphError::corpus(3, "missing count");
        assert_eq!(
            err.to_string(),
            "Corpus format error at line 3: missing count"
        );
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = MorphError::io(
            "words.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("words.txt"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
