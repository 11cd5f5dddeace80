//! Configuration types and per-provider defaults for OpenAI-compatible providers.
//!
//! Each backend that speaks the OpenAI chat completions protocol gets a
//! factory function returning an [`OpenAiCompatConfig`] with its base URL.

use secrecy::SecretString;

/// Configuration for an OpenAI-compatible LLM provider.
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai", "ollama").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub api_key: SecretString,
    /// Model used when a request leaves its model empty.
    pub model: String,
    pub timeout_secs: u64,
}

impl OpenAiCompatConfig {
    /// Replace the base URL if `base_url` is set.
    pub fn with_base_url(mut self, base_url: Option<&str>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

/// OpenAI default configuration. Base URL: `https://api.openai.com/v1`
pub fn openai_defaults(api_key: SecretString, model: &str, timeout_secs: u64) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "openai".into(),
        base_url: "https://api.openai.com/v1".into(),
        api_key,
        model: model.into(),
        timeout_secs,
    }
}

/// Local Ollama configuration. Base URL: `http://localhost:11434/v1`
///
/// Ollama ignores the key, but the client requires one.
pub fn ollama_defaults(model: &str, timeout_secs: u64) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: "ollama".into(),
        base_url: "http://localhost:11434/v1".into(),
        api_key: SecretString::from("ollama"),
        model: model.into(),
        timeout_secs,
    }
}
