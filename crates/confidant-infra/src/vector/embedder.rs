//! FastEmbed-based local embedding generator.
//!
//! Implements the `Embedder` trait from `confidant-core` using one of
//! fastembed's ONNX models, chosen by name from [`LOCAL_MODELS`].
//! Inference is CPU-bound, so each call runs on the blocking pool.

use std::sync::{Arc, Mutex};

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use confidant_core::memory::embedder::Embedder;
use confidant_types::error::EmbeddingError;

/// Supported local models: configured name, fastembed variant, output width.
pub const LOCAL_MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("BAAI/bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("BAAI/bge-small-zh-v1.5", EmbeddingModel::BGESmallZHV15, 512),
    ("BAAI/bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("sentence-transformers/all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2, 384),
    ("intfloat/multilingual-e5-small", EmbeddingModel::MultilingualE5Small, 384),
];

/// Look up a supported local model by its configured name.
pub fn local_model(name: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    LOCAL_MODELS
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, model, dimension)| (model.clone(), *dimension))
        .ok_or_else(|| {
            let supported: Vec<&str> = LOCAL_MODELS.iter().map(|(n, _, _)| *n).collect();
            EmbeddingError::Unavailable(format!(
                "unsupported local embedding model '{name}' (supported: {})",
                supported.join(", ")
            ))
        })
}

/// Local embedder backed by an in-process ONNX model.
pub struct LocalEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl LocalEmbedder {
    /// Load (downloading on first use) the named model.
    ///
    /// `cache_dir` overrides where model files are kept.
    pub fn new(
        model_name: &str,
        cache_dir: Option<std::path::PathBuf>,
    ) -> Result<Self, EmbeddingError> {
        let (variant, dimension) = local_model(model_name)?;
        let mut options = InitOptions::new(variant).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }
        let model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::Unavailable(format!("failed to load local model: {e}")))?;

        tracing::info!(model = model_name, dimension, "Loaded local embedding model");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

impl Embedder for LocalEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbeddingError::Unavailable("embedding model lock poisoned".into()))?;
            model
                .embed(owned, None)
                .map_err(|e| EmbeddingError::Unavailable(format!("local embedding failed: {e}")))
        })
        .await
        .map_err(|e| EmbeddingError::Unavailable(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_model_lookup() {
        let (model, dimension) = local_model("BAAI/bge-small-zh-v1.5").unwrap();
        assert_eq!(model, EmbeddingModel::BGESmallZHV15);
        assert_eq!(dimension, 512);

        let (model, dimension) = local_model("baai/bge-small-en-v1.5").unwrap();
        assert_eq!(model, EmbeddingModel::BGESmallENV15);
        assert_eq!(dimension, 384);
    }

    #[test]
    fn test_unsupported_local_model_is_rejected() {
        let err = local_model("BAAI/bge-huge-xx").unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(ref m) if m.contains("bge-small-zh-v1.5")));
    }
}
