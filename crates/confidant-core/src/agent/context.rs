//! Agent context for Confidant.
//!
//! `AgentContext` is built once at startup and shared (via `Arc`) by every
//! session. It holds the generation provider, the long-term store, the
//! persona and example exchanges, and the per-turn settings.

use confidant_types::chat::Persona;
use confidant_types::config::AppConfig;
use confidant_types::llm::Message;

use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::box_vector::BoxVectorMemoryStore;
use crate::memory::extractor::ExtractionOptions;

/// Settings that shape each turn, resolved from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub agent_name: String,
    /// Window size in rounds; the prompt carries at most twice as many turns.
    pub short_term_rounds: usize,
    pub retrieval_top_k: usize,
    pub background_extraction: bool,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub extraction_temperature: f64,
}

impl TurnSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            agent_name: config.agent.name.clone(),
            short_term_rounds: config.agent.short_term_rounds,
            retrieval_top_k: config.agent.retrieval_top_k,
            background_extraction: config.agent.background_extraction,
            model: config.llm.resolved_model(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            extraction_temperature: config.llm.extraction_temperature,
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Everything a session needs besides its own conversation state.
pub struct AgentContext {
    pub provider: BoxLlmProvider,
    pub store: BoxVectorMemoryStore,
    pub persona: Persona,
    /// Fixed example exchanges, placed between the system prompt and the
    /// transcript on every turn.
    pub examples: Vec<Message>,
    pub settings: TurnSettings,
}

impl AgentContext {
    pub fn new(
        provider: BoxLlmProvider,
        store: BoxVectorMemoryStore,
        persona: Persona,
        examples: Vec<Message>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            provider,
            store,
            persona,
            examples,
            settings,
        }
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            agent_name: self.settings.agent_name.clone(),
            model: self.settings.model.clone(),
            temperature: self.settings.extraction_temperature,
            max_tokens: self.settings.max_tokens,
        }
    }
}
