use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding unavailable: {0}")]
    Unavailable(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from the long-term vector memory store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("embedding dimension mismatch: store holds {expected}-d vectors, provider produced {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("memory store at '{path}' is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("memory store I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<EmbeddingError> for StoreError {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::Unavailable(msg) => StoreError::EmbeddingUnavailable(msg),
            EmbeddingError::DimensionMismatch { expected, actual } => {
                StoreError::DimensionMismatch { expected, actual }
            }
        }
    }
}

/// Errors surfaced to the caller of a conversational turn.
///
/// Only generation failures are user-visible; retrieval and extraction
/// problems degrade to empty results inside the turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("generation failed: {0}")]
    GenerationFailed(#[from] LlmError),
}
