//! LLM provider implementations.
//!
//! Contains concrete implementations of the [`LlmProvider`] trait defined in
//! `confidant-core`: Anthropic's Messages API and any OpenAI-compatible chat
//! completions endpoint (OpenAI, Ollama).
//!
//! [`create_provider`] constructs the configured one once at startup.
//!
//! [`LlmProvider`]: confidant_core::llm::provider::LlmProvider

pub mod anthropic;
pub mod openai_compat;

use std::time::Duration;

use secrecy::SecretString;

use confidant_core::llm::box_provider::BoxLlmProvider;
use confidant_types::config::{LlmProviderKind, LlmSettings};
use confidant_types::llm::LlmError;

use self::anthropic::AnthropicProvider;
use self::openai_compat::OpenAiCompatibleProvider;

/// Read an API key from the environment variable `name`.
///
/// Empty values count as unset.
pub fn api_key_from_env(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

/// Create a [`BoxLlmProvider`] from [`LlmSettings`].
///
/// `api_key` is the resolved secret (see [`api_key_from_env`]). Anthropic and
/// OpenAI require one; Ollama does not.
///
/// # Errors
///
/// `AuthenticationFailed` if the provider needs a key and none is given.
pub fn create_provider(
    settings: &LlmSettings,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    let model = settings.resolved_model();
    tracing::debug!(provider = %settings.provider, %model, "Creating LLM provider");

    match settings.provider {
        LlmProviderKind::Anthropic => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let mut provider =
                AnthropicProvider::new(key, model, Duration::from_secs(settings.timeout_secs))?;
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(BoxLlmProvider::new(provider))
        }
        LlmProviderKind::OpenAi => {
            let key = api_key.ok_or(LlmError::AuthenticationFailed)?;
            let config = openai_compat::config::openai_defaults(key, &model, settings.timeout_secs)
                .with_base_url(settings.base_url.as_deref());
            Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)?))
        }
        LlmProviderKind::Ollama => {
            let mut config = openai_compat::config::ollama_defaults(&model, settings.timeout_secs)
                .with_base_url(settings.base_url.as_deref());
            if let Some(key) = api_key {
                config.api_key = key;
            }
            Ok(BoxLlmProvider::new(OpenAiCompatibleProvider::new(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: LlmProviderKind) -> LlmSettings {
        LlmSettings {
            provider,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_provider_anthropic() {
        let provider = create_provider(
            &settings(LlmProviderKind::Anthropic),
            Some(SecretString::from("sk-ant-test")),
        )
        .unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_create_provider_anthropic_without_key_fails() {
        let err = create_provider(&settings(LlmProviderKind::Anthropic), None)
            .err()
            .unwrap();
        assert!(matches!(err, LlmError::AuthenticationFailed));
    }

    #[test]
    fn test_create_provider_openai() {
        let provider = create_provider(
            &settings(LlmProviderKind::OpenAi),
            Some(SecretString::from("sk-test")),
        )
        .unwrap();
        assert_eq!(provider.name(), "openai");
        assert!(create_provider(&settings(LlmProviderKind::OpenAi), None).is_err());
    }

    #[test]
    fn test_create_provider_ollama_needs_no_key() {
        let provider = create_provider(&settings(LlmProviderKind::Ollama), None).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_api_key_from_env_ignores_unset() {
        assert!(api_key_from_env("CONFIDANT_TEST_SURELY_UNSET_KEY").is_none());
    }
}
