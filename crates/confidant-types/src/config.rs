//! Application configuration types for Confidant.
//!
//! `AppConfig` represents the top-level `confidant.toml` that selects the
//! generation and embedding backends, the memory store location, and the
//! agent's conversational settings.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::memory::SimilarityMetric;

/// Top-level configuration for the Confidant agent.
///
/// Loaded from `{data_dir}/confidant.toml` unless overridden. All fields have
/// sensible defaults, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Conversational behavior of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Display name, also used to label the agent's line in extraction prompts.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Number of rounds (user + agent turn) kept in the prompt window.
    #[serde(default = "default_short_term_rounds")]
    pub short_term_rounds: usize,

    /// How many long-term facts to retrieve per turn.
    #[serde(default = "default_retrieval_top_k")]
    pub retrieval_top_k: usize,

    /// Run fact extraction as a background task after each reply.
    #[serde(default)]
    pub background_extraction: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub examples_file: Option<PathBuf>,

    /// Consumed only when the memory store does not exist yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_memories_file: Option<PathBuf>,
}

fn default_agent_name() -> String {
    "Raymond".to_string()
}

fn default_short_term_rounds() -> usize {
    20
}

fn default_retrieval_top_k() -> usize {
    5
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            short_term_rounds: default_short_term_rounds(),
            retrieval_top_k: default_retrieval_top_k(),
            background_extraction: false,
            persona_file: None,
            examples_file: None,
            seed_memories_file: None,
        }
    }
}

/// Which generation backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Anthropic,
    #[serde(alias = "openai_compatible")]
    OpenAi,
    Ollama,
}

impl LlmProviderKind {
    /// Model used when `llm.model` is left empty.
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProviderKind::Anthropic => "claude-sonnet-4-5-20250929",
            LlmProviderKind::OpenAi => "gpt-4o",
            LlmProviderKind::Ollama => "qwen3:32b",
        }
    }

    /// Environment variable holding the API key when `llm.api_key_env` is unset.
    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            LlmProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            LlmProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            LlmProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProviderKind::Anthropic => write!(f, "anthropic"),
            LlmProviderKind::OpenAi => write!(f, "openai"),
            LlmProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for LlmProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProviderKind::Anthropic),
            "openai" | "openai_compatible" => Ok(LlmProviderKind::OpenAi),
            "ollama" => Ok(LlmProviderKind::Ollama),
            other => Err(format!("invalid llm provider: '{other}'")),
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// Empty means the provider's default model.
    #[serde(default)]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for fact extraction calls (deterministic by default).
    #[serde(default)]
    pub extraction_temperature: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Name of the env var holding the API key (not the key itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f64 {
    0.8
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            extraction_temperature: 0.0,
            base_url: None,
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmSettings {
    /// The configured model, or the provider default when empty.
    pub fn resolved_model(&self) -> String {
        if self.model.trim().is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.clone()
        }
    }

    pub fn resolved_api_key_env(&self) -> Option<String> {
        self.api_key_env
            .clone()
            .or_else(|| self.provider.default_api_key_env().map(str::to_string))
    }
}

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// In-process ONNX model (BGE-small).
    #[default]
    Local,
    #[serde(alias = "openai_compatible")]
    OpenAi,
    Ollama,
}

impl EmbeddingProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            EmbeddingProviderKind::Local => "BAAI/bge-small-en-v1.5",
            EmbeddingProviderKind::OpenAi => "text-embedding-3-small",
            EmbeddingProviderKind::Ollama => "nomic-embed-text",
        }
    }
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProviderKind::Local => write!(f, "local"),
            EmbeddingProviderKind::OpenAi => write!(f, "openai"),
            EmbeddingProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingProviderKind::Local),
            "openai" | "openai_compatible" => Ok(EmbeddingProviderKind::OpenAi),
            "ollama" => Ok(EmbeddingProviderKind::Ollama),
            other => Err(format!("invalid embedding provider: '{other}'")),
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    #[serde(default)]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Output width of a remote model not in the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

impl EmbeddingSettings {
    pub fn resolved_model(&self) -> String {
        if self.model.trim().is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.clone()
        }
    }
}

/// Long-term memory store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Store directory; relative paths resolve against the data directory.
    #[serde(default = "default_memory_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub metric: SimilarityMetric,
}

fn default_memory_path() -> PathBuf {
    PathBuf::from("memory_index")
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            path: default_memory_path(),
            metric: SimilarityMetric::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,

    /// Bridge spans to OpenTelemetry (stdout exporter).
    #[serde(default)]
    pub otel: bool,
}
