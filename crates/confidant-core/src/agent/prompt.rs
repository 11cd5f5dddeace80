//! Prompt assembly for a conversational turn.
//!
//! Layout of the request sent to the generation provider:
//! ```text
//! system:   persona (+ <long_term_memory> block when facts were retrieved)
//! messages: example exchanges, then the windowed transcript
//! ```

use confidant_types::chat::{Persona, Turn};
use confidant_types::llm::{CompletionRequest, Message};

use super::context::AgentContext;

const MEMORY_PREAMBLE: &str = "Fragments you remember that relate to the current topic. \
Do not bring each one up; refer to them only when the conversation naturally calls for it.";

pub struct PromptAssembler;

impl PromptAssembler {
    /// Persona text, with the retrieved facts appended only if there are any.
    pub fn system_prompt(persona: &Persona, retrieved: &[String]) -> String {
        let mut prompt = persona.render();
        if retrieved.is_empty() {
            return prompt;
        }
        let facts = retrieved
            .iter()
            .map(|f| format!("- {f}"))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!(
            "\n\n<long_term_memory>\n{MEMORY_PREAMBLE}\n{facts}\n</long_term_memory>"
        ));
        prompt
    }

    /// Build the generation request for one turn.
    ///
    /// `transcript` must already be windowed and end with the new user turn.
    pub fn build_request(
        agent: &AgentContext,
        retrieved: &[String],
        transcript: &[&Turn],
    ) -> CompletionRequest {
        let mut messages: Vec<Message> =
            Vec::with_capacity(agent.examples.len() + transcript.len());
        messages.extend(agent.examples.iter().cloned());
        messages.extend(transcript.iter().map(|t| t.to_message()));

        CompletionRequest {
            model: agent.settings.model.clone(),
            messages,
            system: Some(Self::system_prompt(&agent.persona, retrieved)),
            max_tokens: agent.settings.max_tokens,
            temperature: Some(agent.settings.temperature),
            stop_sequences: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::context::TurnSettings;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::memory::box_vector::BoxVectorMemoryStore;
    use crate::testing::{InMemoryVectorStore, ScriptedProvider};
    use confidant_types::llm::MessageRole;

    fn persona() -> Persona {
        Persona {
            system_prompt: "You are Raymond.".into(),
            style_notes: vec![],
        }
    }

    #[test]
    fn test_system_prompt_without_memories_is_persona() {
        assert_eq!(PromptAssembler::system_prompt(&persona(), &[]), "You are Raymond.");
    }

    #[test]
    fn test_system_prompt_with_memories() {
        let prompt = PromptAssembler::system_prompt(
            &persona(),
            &["Has a cat named Mochi".into(), "Works night shifts".into()],
        );
        assert!(prompt.starts_with("You are Raymond.\n\n<long_term_memory>"));
        assert!(prompt.contains("- Has a cat named Mochi\n- Works night shifts"));
        assert!(prompt.ends_with("</long_term_memory>"));
    }

    #[test]
    fn test_build_request_orders_examples_before_transcript() {
        let agent = AgentContext::new(
            BoxLlmProvider::new(ScriptedProvider::new(vec![])),
            BoxVectorMemoryStore::new(InMemoryVectorStore::new()),
            persona(),
            vec![Message::user("example q"), Message::assistant("example a")],
            TurnSettings::default(),
        );
        let earlier = Turn::user("hi");
        let reply = Turn::agent("yo");
        let now = Turn::user("what's my cat called");

        let request = PromptAssembler::build_request(&agent, &[], &[&earlier, &reply, &now]);
        let contents: Vec<&str> = request.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["example q", "example a", "hi", "yo", "what's my cat called"]);
        assert_eq!(request.messages[3].role, MessageRole::Assistant);
        assert_eq!(request.system.as_deref(), Some("You are Raymond."));
        assert_eq!(request.max_tokens, 512);
    }
}
