use std::path::PathBuf;

/// Errors returned by the reasoning core.
///
/// Only corpus construction and per-case loading fail outright. Matching, step generation and
/// reference resolution are total functions over their inputs.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("guideline corpus not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    #[error("malformed guideline file {}: {reason}", path.display())]
    MalformedGuideline { path: PathBuf, reason: String },

    #[error("case {id} not found at {}", path.display())]
    CaseNotFound { id: String, path: PathBuf },

    #[error("unsupported case format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("case schema mismatch in {}: {reason}", path.display())]
    CaseSchema { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise case: {0}")]
    Serialization(serde_json::Error),
}

pub type ReasoningResult<T> = std::result::Result<T, ReasoningError>;
