//! BoxVectorMemoryStore -- object-safe dynamic dispatch wrapper for VectorMemoryStore.
//!
//! Same blanket-impl pattern as `BoxLlmProvider`.

use std::future::Future;
use std::pin::Pin;

use confidant_types::error::StoreError;
use confidant_types::memory::MemoryRecord;

use super::vector::VectorMemoryStore;

/// Object-safe version of [`VectorMemoryStore`] with boxed futures.
pub trait VectorMemoryStoreDyn: Send + Sync {
    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, StoreError>> + Send + 'a>>;

    fn add_boxed<'a>(
        &'a self,
        fact: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryRecord, StoreError>> + Send + 'a>>;

    fn count_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = usize> + Send + 'a>>;

    fn records_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<MemoryRecord>> + Send + 'a>>;
}

/// Blanket implementation: any `VectorMemoryStore` automatically implements `VectorMemoryStoreDyn`.
impl<T: VectorMemoryStore> VectorMemoryStoreDyn for T {
    fn search_boxed<'a>(
        &'a self,
        query: &'a str,
        k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, StoreError>> + Send + 'a>> {
        Box::pin(self.search(query, k))
    }

    fn add_boxed<'a>(
        &'a self,
        fact: &'a str,
        topic: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<MemoryRecord, StoreError>> + Send + 'a>> {
        Box::pin(self.add(fact, topic))
    }

    fn count_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = usize> + Send + 'a>> {
        Box::pin(self.count())
    }

    fn records_boxed<'a>(&'a self) -> Pin<Box<dyn Future<Output = Vec<MemoryRecord>> + Send + 'a>> {
        Box::pin(self.records())
    }
}

/// Type-erased vector memory store.
///
/// Held once in `AgentContext` and shared by every session.
pub struct BoxVectorMemoryStore {
    inner: Box<dyn VectorMemoryStoreDyn + Send + Sync>,
}

impl BoxVectorMemoryStore {
    /// Wrap a concrete `VectorMemoryStore` in a type-erased box.
    pub fn new<T: VectorMemoryStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<String>, StoreError> {
        self.inner.search_boxed(query, k).await
    }

    pub async fn add(&self, fact: &str, topic: Option<&str>) -> Result<MemoryRecord, StoreError> {
        self.inner.add_boxed(fact, topic).await
    }

    pub async fn count(&self) -> usize {
        self.inner.count_boxed().await
    }

    pub async fn records(&self) -> Vec<MemoryRecord> {
        self.inner.records_boxed().await
    }
}
