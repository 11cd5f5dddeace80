//! LlmProvider trait definition.
//!
//! This is the generation capability every backend implements. Uses RPITIT
//! for `complete`; `BoxLlmProvider` erases it for runtime selection.

use confidant_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Anthropic, OpenAI, Ollama).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in confidant-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
