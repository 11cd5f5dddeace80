//! Vector memory infrastructure.
//!
//! Provides the file-backed [`FileVectorMemoryStore`](store::FileVectorMemoryStore),
//! the similarity functions it ranks with, and the embedding backends
//! (local fastembed model and OpenAI-compatible endpoint).

pub mod distance;
pub mod embedder;
pub mod openai_embedder;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use confidant_core::memory::box_embedder::BoxEmbedder;
use confidant_types::config::{EmbeddingProviderKind, EmbeddingSettings};
use confidant_types::error::EmbeddingError;

use self::embedder::{LocalEmbedder, local_model};
use self::openai_embedder::{OpenAiEmbedder, known_dimension};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_EMBEDDING_KEY_ENV: &str = "OPENAI_API_KEY";

/// Build the configured embedding backend.
///
/// `api_key` is required for the `openai` backend; `cache_dir` only applies
/// to the local model.
pub fn create_embedder(
    settings: &EmbeddingSettings,
    api_key: Option<SecretString>,
    cache_dir: Option<PathBuf>,
    timeout: Duration,
) -> Result<BoxEmbedder, EmbeddingError> {
    match settings.provider {
        EmbeddingProviderKind::Local => {
            let model = settings.resolved_model();
            let (_, dimension) = local_model(&model)?;
            if let Some(configured) = settings.dimension.filter(|d| *d != dimension) {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: configured,
                    actual: dimension,
                });
            }
            Ok(BoxEmbedder::new(LocalEmbedder::new(&model, cache_dir)?))
        }
        EmbeddingProviderKind::OpenAi | EmbeddingProviderKind::Ollama => {
            let model = settings.resolved_model();
            let dimension = settings
                .dimension
                .or_else(|| known_dimension(&model))
                .ok_or_else(|| {
                    EmbeddingError::Unavailable(format!(
                        "unknown output dimension for embedding model '{model}'; set embedding.dimension"
                    ))
                })?;

            let (default_base, key) = if settings.provider == EmbeddingProviderKind::Ollama {
                (OLLAMA_BASE_URL, api_key.unwrap_or_else(|| SecretString::from("ollama")))
            } else {
                let key = api_key.ok_or_else(|| {
                    EmbeddingError::Unavailable(format!(
                        "no API key for embedding provider (set {})",
                        embedding_key_env(settings)
                    ))
                })?;
                (OPENAI_BASE_URL, key)
            };
            let base_url = settings.base_url.as_deref().unwrap_or(default_base);

            tracing::debug!(provider = %settings.provider, %model, dimension, base_url, "Using remote embeddings");
            Ok(BoxEmbedder::new(OpenAiEmbedder::new(
                base_url, key, model, dimension, timeout,
            )?))
        }
    }
}

/// Environment variable holding the embedding API key.
pub fn embedding_key_env(settings: &EmbeddingSettings) -> String {
    settings
        .api_key_env
        .clone()
        .unwrap_or_else(|| DEFAULT_EMBEDDING_KEY_ENV.to_string())
}
