//! Per-session turn state machine.
//!
//! ```text
//! Idle -> Retrieving -> Generating -> Extracting -> Idle
//! ```
//!
//! Each `Orchestrator` exclusively owns one session's [`ConversationState`].
//! The store and providers are shared through `Arc<AgentContext>`.
//!
//! The new user turn is staged rather than appended: it is committed together
//! with the reply only once generation succeeds, so a failed turn leaves the
//! transcript exactly as it was.

use std::iter;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, info_span};

use confidant_types::chat::{Turn, TurnPhase};
use confidant_types::error::TurnError;

use crate::chat::context::ShortTermContext;
use crate::memory::extractor::FactExtractor;

use super::context::AgentContext;
use super::prompt::PromptAssembler;

/// Mutable state of one conversation.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub context: ShortTermContext,
    /// Facts retrieved for the current (or last) turn; replaced every turn.
    pub retrieved: Vec<String>,
    /// Set right after a reply is generated; cleared on returning to Idle.
    pub pending_extraction: bool,
    pub phase: TurnPhase,
}

pub struct Orchestrator {
    agent: Arc<AgentContext>,
    session_id: String,
    state: ConversationState,
    extraction: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(agent: Arc<AgentContext>, session_id: impl Into<String>) -> Self {
        Self {
            agent,
            session_id: session_id.into(),
            state: ConversationState::default(),
            extraction: None,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.phase
    }

    /// Run one full turn for `user_text` and return the agent's reply.
    ///
    /// Only a generation failure is surfaced; in that case nothing is
    /// recorded. Retrieval and extraction problems are logged and absorbed.
    #[tracing::instrument(
        name = "submit_turn",
        skip(self, user_text),
        fields(session_id = %self.session_id, turns = self.state.context.len())
    )]
    pub async fn submit(&mut self, user_text: &str) -> Result<String, TurnError> {
        // The previous turn's background extraction must land first.
        self.settle().await;

        let staged = Turn::user(user_text);

        self.state.phase = TurnPhase::Retrieving;
        self.state.retrieved = self.retrieve(&staged.text).await;

        self.state.phase = TurnPhase::Generating;
        let reply = match self.generate(&staged).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed; turn discarded");
                self.enter_idle();
                return Err(e);
            }
        };

        self.state.context.append(staged);
        self.state.context.append(Turn::agent(reply.clone()));
        self.state.pending_extraction = true;

        self.state.phase = TurnPhase::Extracting;
        self.extract_latest().await;
        self.enter_idle();

        Ok(reply)
    }

    /// Wait for any in-flight background extraction to finish.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.extraction.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, session_id = %self.session_id, "Background extraction task failed");
            }
        }
    }

    /// Forget this session's conversation. Long-term memory is untouched.
    pub async fn reset(&mut self) {
        self.settle().await;
        self.state = ConversationState::default();
        tracing::info!(session_id = %self.session_id, "Conversation reset");
    }

    fn enter_idle(&mut self) {
        self.state.pending_extraction = false;
        self.state.phase = TurnPhase::Idle;
    }

    #[tracing::instrument(name = "retrieve", skip(self, query), fields(top_k = self.agent.settings.retrieval_top_k))]
    async fn retrieve(&self, query: &str) -> Vec<String> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match self
            .agent
            .store
            .search(query, self.agent.settings.retrieval_top_k)
            .await
        {
            Ok(facts) => {
                tracing::debug!(count = facts.len(), "Retrieved long-term facts");
                facts
            }
            Err(e) => {
                tracing::warn!(error = %e, "Memory search failed; continuing without memories");
                Vec::new()
            }
        }
    }

    async fn generate(&self, staged: &Turn) -> Result<String, TurnError> {
        // The new utterance is always sent, even with a zero-round window.
        let window = self.agent.settings.short_term_rounds.saturating_mul(2).max(1);
        let committed = self.state.context.windowed(self.agent.settings.short_term_rounds);
        let skip = (committed.len() + 1).saturating_sub(window);
        let transcript: Vec<&Turn> = committed
            .iter()
            .chain(iter::once(staged))
            .skip(skip)
            .collect();

        let request = PromptAssembler::build_request(&self.agent, &self.state.retrieved, &transcript);

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.agent.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.request.temperature = ?request.temperature,
            message_count = request.messages.len(),
        );

        let response = self.agent.provider.complete(&request).instrument(span).await?;
        Ok(response.content)
    }

    async fn extract_latest(&mut self) {
        let pending = std::mem::replace(&mut self.state.pending_extraction, false);
        if !pending || self.state.context.len() < 2 {
            return;
        }
        let Some((user, agent_turn)) = self.state.context.latest_exchange() else {
            return;
        };
        let user_text = user.text.clone();
        let agent_text = agent_turn.text.clone();
        let agent = Arc::clone(&self.agent);

        let job = async move {
            let options = agent.extraction_options();
            let facts = FactExtractor::extract(&agent.provider, &options, &user_text, &agent_text)
                .await
                .into_facts();
            if !facts.is_empty() {
                FactExtractor::persist(&agent.store, &facts).await;
            }
        };

        if self.agent.settings.background_extraction {
            let span = info_span!("background_extraction", session_id = %self.session_id);
            self.extraction = Some(tokio::spawn(job.instrument(span)));
        } else {
            job.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::context::TurnSettings;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::memory::box_vector::BoxVectorMemoryStore;
    use crate::testing::{HashEmbedder, InMemoryVectorStore, RequestLog, ScriptedProvider};
    use confidant_types::chat::{Persona, Speaker};
    use confidant_types::llm::{CompletionRequest, LlmError};

    fn is_extraction(request: &CompletionRequest) -> bool {
        request
            .system
            .as_deref()
            .is_some_and(|s| s.starts_with("You are a memory extractor"))
    }

    fn agent_with(
        provider: ScriptedProvider,
        store: InMemoryVectorStore,
        settings: TurnSettings,
    ) -> Arc<AgentContext> {
        Arc::new(AgentContext::new(
            BoxLlmProvider::new(provider),
            BoxVectorMemoryStore::new(store),
            Persona {
                system_prompt: "You are Raymond.".into(),
                style_notes: vec![],
            },
            Vec::new(),
            settings,
        ))
    }

    /// Replies "ok" to chat turns and `facts` to extraction calls.
    fn chatty(facts: &'static str) -> (ScriptedProvider, RequestLog) {
        let provider = ScriptedProvider::from_fn(move |req| {
            if is_extraction(req) {
                Ok(facts.to_string())
            } else {
                Ok("ok".to_string())
            }
        });
        let log = provider.log();
        (provider, log)
    }

    #[tokio::test]
    async fn test_turn_commits_both_turns_and_returns_to_idle() {
        let (provider, _) = chatty("[]");
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        let mut orch = Orchestrator::new(agent, "s1");

        let reply = orch.submit("hello there").await.unwrap();
        assert_eq!(reply, "ok");
        let turns = orch.state().context.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].speaker, Speaker::User);
        assert_eq!(turns[1].speaker, Speaker::Agent);
        assert_eq!(orch.phase(), TurnPhase::Idle);
        assert!(!orch.state().pending_extraction);
    }

    #[tokio::test]
    async fn test_extraction_runs_once_per_turn() {
        let (provider, log) = chatty("[]");
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        let mut orch = Orchestrator::new(agent, "s1");

        orch.submit("one").await.unwrap();
        orch.submit("two").await.unwrap();

        let requests = log.lock().unwrap();
        let extraction_calls = requests.iter().filter(|r| is_extraction(r)).count();
        assert_eq!(requests.len(), 4);
        assert_eq!(extraction_calls, 2);
        assert_eq!(
            requests[3].messages[0].content,
            "User: two\nRaymond: ok"
        );
    }

    #[tokio::test]
    async fn test_generation_failure_records_nothing() {
        let provider = ScriptedProvider::new(vec![
            Ok("first reply".into()),
            Ok("[]".into()),
            Err(LlmError::Overloaded("try later".into())),
        ]);
        let log = provider.log();
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        let mut orch = Orchestrator::new(agent, "s1");

        orch.submit("hi").await.unwrap();
        let err = orch.submit("are you there").await.unwrap_err();
        assert!(matches!(err, TurnError::GenerationFailed(LlmError::Overloaded(_))));

        assert_eq!(orch.state().context.len(), 2);
        assert_eq!(orch.phase(), TurnPhase::Idle);
        assert!(!orch.state().pending_extraction);
        // No extraction call after the failed generation.
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_no_memories() {
        let (provider, log) = chatty("[]");
        let store = InMemoryVectorStore::with_embedder(HashEmbedder::failing(8));
        let agent = agent_with(provider, store, TurnSettings::default());
        let mut orch = Orchestrator::new(agent, "s1");

        assert_eq!(orch.submit("remember me?").await.unwrap(), "ok");
        assert!(orch.state().retrieved.is_empty());
        assert_eq!(log.lock().unwrap()[0].system.as_deref(), Some("You are Raymond."));
    }

    #[tokio::test]
    async fn test_retrieved_is_replaced_each_turn() {
        let (provider, _) = chatty("[]");
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        agent.store.add("Has a cat named Mochi", None).await.unwrap();
        let mut orch = Orchestrator::new(Arc::clone(&agent), "s1");

        orch.submit("my cat").await.unwrap();
        assert_eq!(orch.state().retrieved, vec!["Has a cat named Mochi"]);

        orch.submit("   ").await.unwrap();
        assert!(orch.state().retrieved.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_window_includes_staged_turn() {
        let (provider, log) = chatty("[]");
        let settings = TurnSettings {
            short_term_rounds: 1,
            ..TurnSettings::default()
        };
        let agent = agent_with(provider, InMemoryVectorStore::new(), settings);
        let mut orch = Orchestrator::new(agent, "s1");

        orch.submit("first").await.unwrap();
        orch.submit("second").await.unwrap();

        let requests = log.lock().unwrap();
        let last_chat = requests.iter().filter(|r| !is_extraction(r)).last().unwrap();
        let contents: Vec<&str> = last_chat.messages.iter().map(|m| m.content.as_str()).collect();
        // Window of one round = two turns: the previous reply plus the new utterance.
        assert_eq!(contents, vec!["ok", "second"]);
        assert_eq!(orch.state().context.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_round_window_still_sends_new_message() {
        let (provider, log) = chatty("[]");
        let settings = TurnSettings {
            short_term_rounds: 0,
            ..TurnSettings::default()
        };
        let agent = agent_with(provider, InMemoryVectorStore::new(), settings);
        let mut orch = Orchestrator::new(agent, "s1");

        orch.submit("first").await.unwrap();
        orch.submit("second").await.unwrap();

        let requests = log.lock().unwrap();
        let last_chat = requests.iter().filter(|r| !is_extraction(r)).last().unwrap();
        let contents: Vec<&str> = last_chat.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second"]);
    }

    #[tokio::test]
    async fn test_extracted_facts_reach_store() {
        let (provider, _) = chatty(r#"["Has a cat named Mochi", "cat"]"#);
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        let mut orch = Orchestrator::new(Arc::clone(&agent), "s1");

        orch.submit("I have a cat named Mochi").await.unwrap();
        let records = agent.store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fact, "Has a cat named Mochi");
    }

    #[tokio::test]
    async fn test_background_extraction_settles() {
        let (provider, _) = chatty(r#"["Works night shifts at the hospital"]"#);
        let settings = TurnSettings {
            background_extraction: true,
            ..TurnSettings::default()
        };
        let agent = agent_with(provider, InMemoryVectorStore::new(), settings);
        let mut orch = Orchestrator::new(Arc::clone(&agent), "s1");

        orch.submit("I work night shifts at the hospital").await.unwrap();
        assert_eq!(orch.phase(), TurnPhase::Idle);
        orch.settle().await;
        assert_eq!(agent.store.count().await, 1);
    }

    #[tokio::test]
    async fn test_reset_clears_conversation_but_not_memory() {
        let (provider, _) = chatty(r#"["Has a cat named Mochi"]"#);
        let agent = agent_with(provider, InMemoryVectorStore::new(), TurnSettings::default());
        let mut orch = Orchestrator::new(Arc::clone(&agent), "s1");

        orch.submit("I have a cat named Mochi").await.unwrap();
        orch.reset().await;
        assert!(orch.state().context.is_empty());
        assert!(orch.state().retrieved.is_empty());
        assert_eq!(agent.store.count().await, 1);
    }
}
