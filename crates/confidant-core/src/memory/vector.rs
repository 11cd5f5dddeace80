//! Vector memory store trait.
//!
//! Defines the interface for the shared long-term fact store with
//! similarity search. Implementations (the file-backed store) live in
//! confidant-infra; the store owns its embedder.

use confidant_types::error::StoreError;
use confidant_types::memory::MemoryRecord;

/// Trait for persistent, embedding-indexed fact storage.
///
/// One store is shared by every session, so implementations must tolerate
/// concurrent `search` and `add` calls. `add` persists synchronously
/// before returning.
pub trait VectorMemoryStore: Send + Sync {
    /// Return at most `k` facts, most similar first, ties in insertion order.
    ///
    /// An empty store or `k == 0` yields an empty vector, not an error.
    fn search(
        &self,
        query: &str,
        k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    /// Embed, append and persist a conversation fact. Never deduplicates.
    fn add(
        &self,
        fact: &str,
        topic: Option<&str>,
    ) -> impl std::future::Future<Output = Result<MemoryRecord, StoreError>> + Send;

    /// Number of live records.
    fn count(&self) -> impl std::future::Future<Output = usize> + Send;

    /// Snapshot of all records in insertion order.
    fn records(&self) -> impl std::future::Future<Output = Vec<MemoryRecord>> + Send;
}
