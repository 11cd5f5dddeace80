//! Session-facing API.
//!
//! `SessionService` owns one [`Orchestrator`] per session id. Each
//! orchestrator sits behind its own `tokio::sync::Mutex`, so concurrent
//! submits to one session queue while different sessions run in parallel
//! and share only the store and providers.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use confidant_types::error::{StoreError, TurnError};
use confidant_types::memory::MemoryRecord;

use crate::agent::context::AgentContext;
use crate::agent::orchestrator::Orchestrator;

/// Snapshot of service-wide counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub record_count: usize,
    pub session_count: usize,
}

pub struct SessionService {
    agent: Arc<AgentContext>,
    sessions: DashMap<String, Arc<Mutex<Orchestrator>>>,
}

impl SessionService {
    pub fn new(agent: Arc<AgentContext>) -> Self {
        Self {
            agent,
            sessions: DashMap::new(),
        }
    }

    pub fn agent(&self) -> &Arc<AgentContext> {
        &self.agent
    }

    fn session(&self, session_id: &str) -> Arc<Mutex<Orchestrator>> {
        let entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id, "Starting session");
                Arc::new(Mutex::new(Orchestrator::new(
                    Arc::clone(&self.agent),
                    session_id,
                )))
            });
        Arc::clone(entry.value())
    }

    fn existing(&self, session_id: &str) -> Option<Arc<Mutex<Orchestrator>>> {
        self.sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Run one turn in `session_id`, creating the session on first use.
    pub async fn submit(&self, session_id: &str, user_text: &str) -> Result<String, TurnError> {
        let session = self.session(session_id);
        let mut orchestrator = session.lock().await;
        orchestrator.submit(user_text).await
    }

    /// Clear a session's conversation. Unknown sessions are a no-op.
    pub async fn reset(&self, session_id: &str) {
        if let Some(session) = self.existing(session_id) {
            session.lock().await.reset().await;
        }
    }

    /// Wait for a session's background extraction, if any.
    pub async fn settle(&self, session_id: &str) {
        if let Some(session) = self.existing(session_id) {
            session.lock().await.settle().await;
        }
    }

    /// Facts injected into the session's most recent prompt.
    pub async fn last_retrieved(&self, session_id: &str) -> Vec<String> {
        match self.existing(session_id) {
            Some(session) => session.lock().await.state().retrieved.clone(),
            None => Vec::new(),
        }
    }

    /// Drop a session after letting its pending extraction finish.
    ///
    /// Returns whether the session existed.
    pub async fn end_session(&self, session_id: &str) -> bool {
        let Some((_, session)) = self.sessions.remove(session_id) else {
            return false;
        };
        session.lock().await.settle().await;
        tracing::debug!(session_id, "Session ended");
        true
    }

    pub async fn stats(&self) -> ServiceStats {
        ServiceStats {
            record_count: self.agent.store.count().await,
            session_count: self.sessions.len(),
        }
    }

    /// Similarity search over long-term memory. Failures degrade to `[]`.
    pub async fn search_memory(&self, query: &str, k: usize) -> Vec<String> {
        match self.agent.store.search(query, k).await {
            Ok(facts) => facts,
            Err(e) => {
                tracing::warn!(error = %e, "Memory search failed");
                Vec::new()
            }
        }
    }

    /// Store a fact directly, bypassing extraction.
    pub async fn remember(&self, fact: &str) -> Result<MemoryRecord, StoreError> {
        self.agent.store.add(fact.trim(), None).await
    }

    pub async fn records(&self) -> Vec<MemoryRecord> {
        self.agent.store.records().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::context::TurnSettings;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::memory::box_vector::BoxVectorMemoryStore;
    use crate::testing::{HashEmbedder, InMemoryVectorStore, ScriptedProvider};
    use confidant_types::chat::Persona;
    use futures_util::future::join_all;

    fn service_with(store: InMemoryVectorStore) -> SessionService {
        let provider = ScriptedProvider::from_fn(|req| {
            let extracting = req
                .system
                .as_deref()
                .is_some_and(|s| s.starts_with("You are a memory extractor"));
            if extracting {
                Ok("[]".to_string())
            } else {
                let last = req.messages.last().map(|m| m.content.clone()).unwrap_or_default();
                Ok(format!("echo: {last}"))
            }
        });
        SessionService::new(Arc::new(AgentContext::new(
            BoxLlmProvider::new(provider),
            BoxVectorMemoryStore::new(store),
            Persona::default(),
            Vec::new(),
            TurnSettings::default(),
        )))
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let service = service_with(InMemoryVectorStore::new());
        assert_eq!(service.submit("alice", "hi from alice").await.unwrap(), "echo: hi from alice");
        assert_eq!(service.submit("bob", "hi from bob").await.unwrap(), "echo: hi from bob");

        let stats = service.stats().await;
        assert_eq!(stats.session_count, 2);
        assert_eq!(stats.record_count, 0);
    }

    #[tokio::test]
    async fn test_concurrent_submits_to_one_session_queue() {
        let service = Arc::new(service_with(InMemoryVectorStore::new()));
        let calls = (0..8).map(|i| {
            let service = Arc::clone(&service);
            async move { service.submit("s", &format!("msg {i}")).await }
        });
        for result in join_all(calls).await {
            assert!(result.is_ok());
        }

        let session = service.existing("s").unwrap();
        let orchestrator = session.lock().await;
        let turns = orchestrator.state().context.turns();
        assert_eq!(turns.len(), 16);
        // Turns stay paired: every user turn is directly followed by its echo.
        for pair in turns.chunks(2) {
            assert_eq!(pair[1].text, format!("echo: {}", pair[0].text));
        }
    }

    #[tokio::test]
    async fn test_reset_and_end_session() {
        let service = service_with(InMemoryVectorStore::new());
        service.submit("s", "hello").await.unwrap();
        service.reset("s").await;
        {
            let session = service.existing("s").unwrap();
            assert!(session.lock().await.state().context.is_empty());
        }

        assert!(service.end_session("s").await);
        assert!(!service.end_session("s").await);
        assert_eq!(service.stats().await.session_count, 0);
        // Unknown session reset is a no-op.
        service.reset("nobody").await;
    }

    #[tokio::test]
    async fn test_search_memory_degrades_on_failure() {
        let service = service_with(InMemoryVectorStore::with_embedder(HashEmbedder::failing(8)));
        assert!(matches!(
            service.remember("Has a cat named Mochi").await,
            Err(StoreError::EmbeddingUnavailable(_))
        ));
        assert!(service.search_memory("cat", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_remember_then_search() {
        let service = service_with(InMemoryVectorStore::new());
        service.remember("  Has a cat named Mochi ").await.unwrap();
        assert_eq!(service.search_memory("cat", 3).await, vec!["Has a cat named Mochi"]);
        assert_eq!(service.records().await.len(), 1);
        assert!(service.search_memory("cat", 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_last_retrieved_reflects_latest_turn() {
        let service = service_with(InMemoryVectorStore::new());
        assert!(service.last_retrieved("s").await.is_empty());

        service.remember("Has a cat named Mochi").await.unwrap();
        service.submit("s", "how is my cat").await.unwrap();
        assert_eq!(service.last_retrieved("s").await, vec!["Has a cat named Mochi"]);
    }
}
