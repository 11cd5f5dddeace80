//! Long-term fact extraction via LLM.
//!
//! After each completed exchange, `FactExtractor` asks the generation
//! provider whether the user revealed anything worth remembering. The
//! provider must answer with a bare JSON array of strings. Anything else is
//! a degraded outcome: logged with its reason and treated as "no facts".

use confidant_types::llm::{CompletionRequest, Message};

use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::box_vector::BoxVectorMemoryStore;

/// System prompt for the extraction call.
const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a memory extractor. Read the exchange below and decide whether the user mentioned any new fact worth remembering long-term (personal details, preferences, plans, major events, hobbies and other concrete information).

Rules:
- Extract only concrete, informative facts. Do not extract vague moods or greetings.
- "The user is in a bad mood today" is too vague to keep.
- "The user is preparing for graduate entrance exams" or "The user has a cat named Mochi" are worth keeping.

If there are such facts, output a JSON array where each element is one fact as a string.
If there is nothing new worth remembering, output only an empty array: []

Output only the JSON array and nothing else."#;

/// Minimum number of characters (after trimming) a fact must exceed.
const MIN_FACT_CHARS: usize = 5;

/// Why an extraction produced no usable facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// The generation call itself failed.
    ProviderFailed,
    /// The response was not valid JSON.
    MalformedJson,
    /// The response was valid JSON but not an array.
    NotAnArray,
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradedReason::ProviderFailed => write!(f, "provider_failed"),
            DegradedReason::MalformedJson => write!(f, "malformed_json"),
            DegradedReason::NotAnArray => write!(f, "not_an_array"),
        }
    }
}

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Accepted facts, deduplicated, in response order. May be empty.
    Facts(Vec<String>),
    Degraded(DegradedReason),
}

impl ExtractionOutcome {
    /// Facts to persist; degraded outcomes contribute none.
    pub fn into_facts(self) -> Vec<String> {
        match self {
            ExtractionOutcome::Facts(facts) => facts,
            ExtractionOutcome::Degraded(_) => Vec::new(),
        }
    }
}

/// Generation parameters for the extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Label for the agent's line in the exchange shown to the model.
    pub agent_name: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Stateless utility that distills long-term facts from one exchange.
pub struct FactExtractor;

impl FactExtractor {
    /// Ask the provider for facts in a single user/agent exchange.
    ///
    /// Never fails: provider and parse errors become
    /// [`ExtractionOutcome::Degraded`] and are logged at `warn`.
    #[tracing::instrument(
        name = "extract_facts",
        skip(provider, options, user_text, agent_text),
        fields(provider = provider.name())
    )]
    pub async fn extract(
        provider: &BoxLlmProvider,
        options: &ExtractionOptions,
        user_text: &str,
        agent_text: &str,
    ) -> ExtractionOutcome {
        let request = CompletionRequest {
            model: options.model.clone(),
            messages: vec![Message::user(format!(
                "User: {user_text}\n{}: {agent_text}",
                options.agent_name
            ))],
            system: Some(EXTRACTION_SYSTEM_PROMPT.to_string()),
            max_tokens: options.max_tokens,
            temperature: Some(options.temperature),
            stop_sequences: None,
        };

        let outcome = match provider.complete(&request).await {
            Ok(response) => Self::parse_response(&response.content),
            Err(e) => {
                tracing::warn!(error = %e, reason = %DegradedReason::ProviderFailed, "Fact extraction call failed");
                return ExtractionOutcome::Degraded(DegradedReason::ProviderFailed);
            }
        };

        match &outcome {
            ExtractionOutcome::Facts(facts) => {
                tracing::debug!(count = facts.len(), "Extracted facts");
            }
            ExtractionOutcome::Degraded(reason) => {
                tracing::warn!(%reason, "Fact extraction response unusable; keeping nothing");
            }
        }
        outcome
    }

    /// Parse a raw extraction response into an outcome.
    pub fn parse_response(raw: &str) -> ExtractionOutcome {
        let body = strip_code_fence(raw);
        let value: serde_json::Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    content_preview = %body.chars().take(200).collect::<String>(),
                    "Extraction response is not JSON"
                );
                return ExtractionOutcome::Degraded(DegradedReason::MalformedJson);
            }
        };
        let Some(items) = value.as_array() else {
            return ExtractionOutcome::Degraded(DegradedReason::NotAnArray);
        };

        let mut facts: Vec<String> = Vec::new();
        for fact in items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::trim)
            .filter(|f| f.chars().count() > MIN_FACT_CHARS)
        {
            if !facts.iter().any(|seen| seen == fact) {
                facts.push(fact.to_string());
            }
        }
        ExtractionOutcome::Facts(facts)
    }

    /// Write each fact with an independent `add`. Returns how many landed.
    ///
    /// A failed write is logged and does not stop the remaining ones.
    pub async fn persist(store: &BoxVectorMemoryStore, facts: &[String]) -> usize {
        let mut written = 0;
        for fact in facts {
            match store.add(fact, None).await {
                Ok(record) => {
                    tracing::info!(id = %record.id, fact = %record.fact, "Remembered new fact");
                    written += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, fact = %fact, "Failed to persist extracted fact");
                }
            }
        }
        written
    }
}

/// Strip one optional Markdown code fence around the payload.
///
/// A leading fence line (with optional language tag) is dropped along with
/// everything from the last closing fence onwards.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let after_open = match trimmed.split_once('\n') {
        Some((_, rest)) => rest,
        None => return "",
    };
    match after_open.rfind("```") {
        Some(end) => after_open[..end].trim(),
        None => after_open.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryVectorStore, ScriptedProvider};
    use confidant_types::llm::LlmError;

    fn options() -> ExtractionOptions {
        ExtractionOptions {
            agent_name: "Raymond".into(),
            model: String::new(),
            temperature: 0.0,
            max_tokens: 512,
        }
    }

    #[test]
    fn test_parse_plain_array() {
        let outcome = FactExtractor::parse_response(r#"["Has a cat named Mochi"]"#);
        assert_eq!(
            outcome,
            ExtractionOutcome::Facts(vec!["Has a cat named Mochi".to_string()])
        );
    }

    #[test]
    fn test_parse_fenced_array_with_language_tag() {
        let raw = "```json\n[\"Is training for a marathon\"]\n```";
        assert_eq!(
            FactExtractor::parse_response(raw),
            ExtractionOutcome::Facts(vec!["Is training for a marathon".to_string()])
        );
    }

    #[test]
    fn test_parse_fenced_array_without_tag() {
        let raw = "```\n[]\n```";
        assert_eq!(FactExtractor::parse_response(raw), ExtractionOutcome::Facts(vec![]));
    }

    #[test]
    fn test_parse_empty_array_is_facts_not_degraded() {
        assert_eq!(FactExtractor::parse_response("[]"), ExtractionOutcome::Facts(vec![]));
    }

    #[test]
    fn test_parse_malformed_and_non_array() {
        assert_eq!(
            FactExtractor::parse_response("sure! here you go"),
            ExtractionOutcome::Degraded(DegradedReason::MalformedJson)
        );
        assert_eq!(
            FactExtractor::parse_response(r#"{"facts": ["Has a cat"]}"#),
            ExtractionOutcome::Degraded(DegradedReason::NotAnArray)
        );
    }

    #[test]
    fn test_parse_filters_short_and_non_string_items() {
        let raw = r#"["cat", 42, null, "  hello  ", "abcdef", "Lives in Lisbon"]"#;
        assert_eq!(
            FactExtractor::parse_response(raw),
            ExtractionOutcome::Facts(vec!["abcdef".to_string(), "Lives in Lisbon".to_string()])
        );
    }

    #[test]
    fn test_parse_counts_characters_not_bytes() {
        // Five CJK characters are 15 bytes but not long enough.
        let raw = r#"["养了一只猫", "养了一只叫小白的猫"]"#;
        assert_eq!(
            FactExtractor::parse_response(raw),
            ExtractionOutcome::Facts(vec!["养了一只叫小白的猫".to_string()])
        );
    }

    #[test]
    fn test_parse_collapses_exact_duplicates() {
        let raw = r#"["Has a cat named Mochi", "Has a cat named Mochi", "Works night shifts"]"#;
        assert_eq!(
            FactExtractor::parse_response(raw).into_facts(),
            vec!["Has a cat named Mochi", "Works night shifts"]
        );
    }

    #[test]
    fn test_strip_code_fence_lone_fence_line() {
        assert_eq!(strip_code_fence("```json"), "");
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
    }

    #[tokio::test]
    async fn test_extract_sends_exchange_and_instruction() {
        let scripted = ScriptedProvider::new(vec![Ok(r#"["Has a cat named Mochi"]"#.into())]);
        let log = scripted.log();
        let provider = BoxLlmProvider::new(scripted);

        let outcome =
            FactExtractor::extract(&provider, &options(), "I have a cat named Mochi", "cute").await;
        assert_eq!(outcome.into_facts(), vec!["Has a cat named Mochi"]);

        let requests = log.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].messages[0].content,
            "User: I have a cat named Mochi\nRaymond: cute"
        );
        assert!(requests[0].system.as_deref().unwrap().contains("JSON array"));
        assert_eq!(requests[0].temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_extract_provider_failure_degrades() {
        let provider = BoxLlmProvider::new(ScriptedProvider::new(vec![Err(LlmError::Overloaded(
            "busy".into(),
        ))]));
        let outcome = FactExtractor::extract(&provider, &options(), "hi", "hey").await;
        assert_eq!(outcome, ExtractionOutcome::Degraded(DegradedReason::ProviderFailed));
    }

    #[tokio::test]
    async fn test_persist_writes_each_fact() {
        let store = BoxVectorMemoryStore::new(InMemoryVectorStore::new());
        let facts = vec!["Has a cat named Mochi".to_string(), "Works night shifts".to_string()];
        assert_eq!(FactExtractor::persist(&store, &facts).await, 2);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn test_persist_continues_past_failures() {
        let store = BoxVectorMemoryStore::new(InMemoryVectorStore::with_embedder(
            crate::testing::HashEmbedder::failing(8),
        ));
        let facts = vec!["Has a cat named Mochi".to_string()];
        assert_eq!(FactExtractor::persist(&store, &facts).await, 0);
    }
}
