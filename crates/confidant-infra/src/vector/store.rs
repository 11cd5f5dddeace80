//! File-backed vector memory store.
//!
//! [`FileVectorMemoryStore`] keeps every record and its embedding in memory
//! for brute-force similarity search and mirrors them to a single JSON
//! document, `{path}/memory.json`:
//!
//! ```text
//! {
//!   "version": 1,
//!   "index":   { "dimension", "metric", "model", "ids": [...], "vectors": [[...]] },
//!   "records": { "<id>": { "fact", "topic", "confidence", "source", "created_at" } }
//! }
//! ```
//!
//! Writes go to a temp file in the same directory and are renamed into place,
//! so a crash mid-write leaves the previous document intact. A dedicated
//! writer mutex serializes `add` end to end (snapshot + persist + publish):
//! persisted snapshots are totally ordered and no write is lost. A record
//! becomes visible to searches only after it is on disk.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use confidant_core::memory::box_embedder::BoxEmbedder;
use confidant_core::memory::vector::VectorMemoryStore;
use confidant_types::error::StoreError;
use confidant_types::memory::{
    Confidence, MemoryRecord, MemorySource, SeedMemory, SimilarityMetric,
};

use super::distance::similarity;

const STORE_FILE: &str = "memory.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedStore {
    version: u32,
    index: PersistedIndex,
    records: BTreeMap<Uuid, PersistedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedIndex {
    dimension: usize,
    metric: SimilarityMetric,
    model: String,
    ids: Vec<Uuid>,
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedRecord {
    fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    topic: Option<String>,
    #[serde(default)]
    confidence: Confidence,
    source: MemorySource,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Entry {
    record: MemoryRecord,
    vector: Vec<f32>,
}

/// Persistent fact store with brute-force similarity search.
pub struct FileVectorMemoryStore {
    dir: PathBuf,
    embedder: BoxEmbedder,
    metric: SimilarityMetric,
    dimension: usize,
    entries: RwLock<Vec<Entry>>,
    writer: Mutex<()>,
}

impl FileVectorMemoryStore {
    /// Open the store at `path`, or create it from `seeds` if it does not exist.
    ///
    /// Seeds are ignored when a persisted store is found. A new store
    /// (possibly empty) is persisted before this returns.
    #[tracing::instrument(
        name = "memory_store_load",
        skip(path, seeds, embedder),
        fields(path = %path.display(), seeds = seeds.len(), model = embedder.model_name())
    )]
    pub async fn load_or_init(
        path: &Path,
        seeds: &[SeedMemory],
        embedder: BoxEmbedder,
        metric: SimilarityMetric,
    ) -> Result<Self, StoreError> {
        let file = path.join(STORE_FILE);
        let exists = tokio::fs::try_exists(&file)
            .await
            .map_err(|source| StoreError::Io {
                path: file.clone(),
                source,
            })?;

        if exists {
            let store = Self::load(path, &file, embedder, metric).await?;
            tracing::info!(records = store.count().await, "Loaded memory store");
            return Ok(store);
        }

        let records: Vec<MemoryRecord> = seeds.iter().map(MemoryRecord::from_seed).collect();
        let vectors = if records.is_empty() {
            Vec::new()
        } else {
            let texts: Vec<String> = records.iter().map(|r| r.fact.clone()).collect();
            embedder.embed(&texts).await?
        };

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let entries: Vec<Entry> = records
            .into_iter()
            .zip(vectors)
            .map(|(record, vector)| Entry { record, vector })
            .collect();

        let store = Self {
            dir: path.to_path_buf(),
            dimension: embedder.dimension(),
            embedder,
            metric,
            entries: RwLock::new(Vec::new()),
            writer: Mutex::new(()),
        };
        store.persist(store.snapshot(&entries)).await?;
        *store.entries.write().await = entries;

        tracing::info!(records = store.count().await, "Initialized memory store");
        Ok(store)
    }

    async fn load(
        dir: &Path,
        file: &Path,
        embedder: BoxEmbedder,
        metric: SimilarityMetric,
    ) -> Result<Self, StoreError> {
        let bytes = tokio::fs::read(file).await.map_err(|source| StoreError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        let corrupt = |reason: String| StoreError::Corrupt {
            path: file.to_path_buf(),
            reason,
        };

        let persisted: PersistedStore =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(format!("undeserializable: {e}")))?;
        let entries = validate(persisted.clone()).map_err(corrupt)?;

        if persisted.index.dimension != embedder.dimension() {
            return Err(StoreError::DimensionMismatch {
                expected: persisted.index.dimension,
                actual: embedder.dimension(),
            });
        }
        if persisted.index.model != embedder.model_name() {
            tracing::warn!(
                stored = %persisted.index.model,
                configured = embedder.model_name(),
                "Embedding model differs from the one that built this store"
            );
        }
        if persisted.index.metric != metric {
            tracing::info!(
                stored = %persisted.index.metric,
                configured = %metric,
                "Ranking with configured metric"
            );
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            dimension: persisted.index.dimension,
            embedder,
            metric,
            entries: RwLock::new(entries),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    fn snapshot(&self, entries: &[Entry]) -> PersistedStore {
        PersistedStore {
            version: FORMAT_VERSION,
            index: PersistedIndex {
                dimension: self.dimension,
                metric: self.metric,
                model: self.embedder.model_name().to_string(),
                ids: entries.iter().map(|e| e.record.id).collect(),
                vectors: entries.iter().map(|e| e.vector.clone()).collect(),
            },
            records: entries
                .iter()
                .map(|e| {
                    (
                        e.record.id,
                        PersistedRecord {
                            fact: e.record.fact.clone(),
                            topic: e.record.topic.clone(),
                            confidence: e.record.confidence,
                            source: e.record.source,
                            created_at: e.record.created_at,
                        },
                    )
                })
                .collect(),
        }
    }

    /// Atomically replace `memory.json` with `snapshot`.
    async fn persist(&self, snapshot: PersistedStore) -> Result<(), StoreError> {
        let dir = self.dir.clone();
        let target = dir.join(STORE_FILE);
        let bytes = serde_json::to_vec(&snapshot).map_err(|e| StoreError::Io {
            path: target.clone(),
            source: std::io::Error::other(e),
        })?;

        let io_target = target.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&io_target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io {
            path: target.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|source| StoreError::Io {
            path: target,
            source,
        })
    }
}

/// Check internal consistency and rebuild entries in index order.
fn validate(persisted: PersistedStore) -> Result<Vec<Entry>, String> {
    let PersistedStore { index, mut records, .. } = persisted;

    if index.ids.len() != index.vectors.len() {
        return Err(format!(
            "index has {} ids but {} vectors",
            index.ids.len(),
            index.vectors.len()
        ));
    }
    let mut seen = HashSet::with_capacity(index.ids.len());
    if let Some(dup) = index.ids.iter().find(|id| !seen.insert(**id)) {
        return Err(format!("duplicate id {dup} in index"));
    }
    if records.len() != index.ids.len() {
        return Err(format!(
            "{} metadata records for {} indexed ids",
            records.len(),
            index.ids.len()
        ));
    }

    let mut entries = Vec::with_capacity(index.ids.len());
    for (id, vector) in index.ids.into_iter().zip(index.vectors) {
        if vector.len() != index.dimension {
            return Err(format!(
                "vector for {id} has {} entries, expected {}",
                vector.len(),
                index.dimension
            ));
        }
        let meta = records
            .remove(&id)
            .ok_or_else(|| format!("indexed id {id} has no metadata"))?;
        entries.push(Entry {
            record: MemoryRecord {
                id,
                fact: meta.fact,
                topic: meta.topic,
                confidence: meta.confidence,
                source: meta.source,
                created_at: meta.created_at,
            },
            vector,
        });
    }
    Ok(entries)
}

impl VectorMemoryStore for FileVectorMemoryStore {
    #[tracing::instrument(name = "memory_search", skip(self, query))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StoreError> {
        if k == 0 || self.entries.read().await.is_empty() {
            return Ok(Vec::new());
        }
        let q = self.embedder.embed_one(query).await?;

        let entries = self.entries.read().await;
        let mut scored: Vec<(f32, usize)> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let score = similarity(self.metric, &q, &e.vector);
                (if score.is_nan() { f32::NEG_INFINITY } else { score }, i)
            })
            .collect();
        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(_, i)| entries[i].record.fact.clone())
            .collect())
    }

    #[tracing::instrument(name = "memory_add", skip(self, fact, topic))]
    async fn add(&self, fact: &str, topic: Option<&str>) -> Result<MemoryRecord, StoreError> {
        let vector = self.embedder.embed_one(fact).await?;
        let record = MemoryRecord::from_conversation(fact, topic.map(str::to_string));
        let entry = Entry {
            record: record.clone(),
            vector,
        };

        let _writer = self.writer.lock().await;
        let snapshot = {
            let entries = self.entries.read().await;
            let mut next = self.snapshot(&entries);
            next.index.ids.push(entry.record.id);
            next.index.vectors.push(entry.vector.clone());
            next.records.insert(
                entry.record.id,
                PersistedRecord {
                    fact: record.fact.clone(),
                    topic: record.topic.clone(),
                    confidence: record.confidence,
                    source: record.source,
                    created_at: record.created_at,
                },
            );
            next
        };

        if let Err(e) = self.persist(snapshot).await {
            tracing::error!(error = %e, "Failed to persist memory store; record discarded");
            return Err(e);
        }
        self.entries.write().await.push(entry);

        tracing::debug!(id = %record.id, "Added memory record");
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
            .map(|e| e.record.clone())
            .collect()
    }
}
