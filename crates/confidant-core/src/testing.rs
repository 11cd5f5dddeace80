//! Deterministic fakes for the capability traits.
//!
//! Compiled for this crate's tests and, behind the `test-support` feature,
//! for downstream crates' tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::RwLock;

use confidant_types::error::{EmbeddingError, StoreError};
use confidant_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
use confidant_types::memory::MemoryRecord;

use crate::llm::provider::LlmProvider;
use crate::memory::embedder::Embedder;
use crate::memory::vector::VectorMemoryStore;

/// Bag-of-words embedder: each lowercase word is hashed (FNV-1a) into one
/// of `dimension` buckets. Texts sharing words score higher under cosine.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    fail: bool,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fail: false,
        }
    }

    /// An embedder whose every call fails with `Unavailable`.
    pub fn failing(dimension: usize) -> Self {
        Self {
            dimension,
            fail: true,
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for byte in word.to_lowercase().bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            v[(hash % self.dimension as u64) as usize] += 1.0;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.fail {
            return Err(EmbeddingError::Unavailable("embedder offline".into()));
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hash-bag-of-words"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

/// Shared log of every request a [`ScriptedProvider`] received.
pub type RequestLog = Arc<Mutex<Vec<CompletionRequest>>>;

/// Provider that answers from a script (or a closure) and logs requests.
pub struct ScriptedProvider {
    responder: Responder,
    log: RequestLog,
}

impl ScriptedProvider {
    /// Answer with the scripted results in order; fails once exhausted.
    pub fn new(script: Vec<Result<String, LlmError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(script));
        Self::from_fn(move |_| {
            queue
                .lock()
                .map_err(|_| LlmError::Provider {
                    message: "script lock poisoned".into(),
                })?
                .pop_front()
                .unwrap_or_else(|| {
                    Err(LlmError::Provider {
                        message: "script exhausted".into(),
                    })
                })
        })
    }

    /// Answer every request by calling `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the request log, usable after the provider is boxed.
    pub fn log(&self) -> RequestLog {
        Arc::clone(&self.log)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }
        let content = (self.responder)(request)?;
        Ok(CompletionResponse {
            id: format!("scripted-{}", Utc::now().timestamp_micros()),
            content,
            model: request.model.clone(),
            stop_reason: StopReason::EndTurn,
            usage: Usage::default(),
        })
    }
}

/// Non-persistent store with the same search contract as the file store.
pub struct InMemoryVectorStore {
    embedder: HashEmbedder,
    entries: RwLock<Vec<(MemoryRecord, Vec<f32>)>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::with_embedder(HashEmbedder::new(64))
    }

    pub fn with_embedder(embedder: HashEmbedder) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

impl VectorMemoryStore for InMemoryVectorStore {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        // Embeds before the emptiness check so a failing embedder always surfaces.
        let q = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .pop()
            .unwrap_or_default();
        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, &str)> = entries
            .iter()
            .map(|(r, v)| (cosine(&q, v), r.fact.as_str()))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, f)| f.to_string()).collect())
    }

    async fn add(&self, fact: &str, topic: Option<&str>) -> Result<MemoryRecord, StoreError> {
        let v = self
            .embedder
            .embed(&[fact.to_string()])
            .await?
            .pop()
            .unwrap_or_default();
        let record = MemoryRecord::from_conversation(fact, topic.map(str::to_string));
        self.entries.write().await.push((record.clone(), v));
        Ok(record)
    }

    async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn records(&self) -> Vec<MemoryRecord> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(r, _)| r.clone())
            .collect()
    }
}
