use std::path::PathBuf;

/// Errors returned by the evaluation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// A metric that aggregates over reference texts was given none.
    #[error("{0} requires at least one reference text")]
    EmptyReferences(&'static str),

    #[error("embedder returned {actual} vectors for {expected} texts")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read evaluation config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid evaluation config {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },
}

pub type EvaluationResult<T> = std::result::Result<T, EvaluationError>;
