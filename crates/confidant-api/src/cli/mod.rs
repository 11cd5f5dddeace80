//! CLI command definitions for the `confidant` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags select the
//! config file, output format and verbosity; a few config values can be
//! overridden from flags or their environment variables.

pub mod chat;
pub mod config;
pub mod memory;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use confidant_types::config::{AppConfig, EmbeddingProviderKind, LlmProviderKind};

/// Chat with a companion that remembers you.
#[derive(Parser)]
#[command(name = "confidant", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (default: {data_dir}/confidant.toml).
    #[arg(long, global = true, env = "CONFIDANT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Config values settable from the command line or environment.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// LLM backend (anthropic, openai, ollama).
    #[arg(long, global = true, env = "CONFIDANT_LLM_PROVIDER")]
    pub llm_provider: Option<LlmProviderKind>,

    /// Generation model name.
    #[arg(long, global = true, env = "CONFIDANT_LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Embedding backend (local, openai, ollama).
    #[arg(long, global = true, env = "CONFIDANT_EMBED_PROVIDER")]
    pub embed_provider: Option<EmbeddingProviderKind>,

    /// Memory store directory.
    #[arg(long, global = true, env = "CONFIDANT_MEMORY_PATH")]
    pub memory_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Apply every set override on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(provider) = self.llm_provider {
            if provider != config.llm.provider {
                // The configured model belongs to the old provider.
                config.llm.model.clear();
            }
            config.llm.provider = provider;
        }
        if let Some(model) = &self.llm_model {
            config.llm.model = model.clone();
        }
        if let Some(provider) = self.embed_provider {
            if provider != config.embedding.provider {
                config.embedding.model.clear();
            }
            config.embedding.provider = provider;
        }
        if let Some(path) = &self.memory_path {
            config.memory.path = path.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Show which memories were recalled for each reply.
        #[arg(long, short = 'V')]
        show_memories: bool,
    },

    /// Show memory store statistics.
    Stats,

    /// Search long-term memory.
    Search {
        /// Free-text query.
        query: String,

        /// Maximum number of facts to return.
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// Store a fact in long-term memory directly.
    Remember {
        /// The fact to remember.
        fact: String,
    },

    /// Inspect long-term memory.
    Memory {
        #[command(subcommand)]
        action: MemoryCommand,
    },

    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum MemoryCommand {
    /// List every stored fact.
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration.
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_k() {
        let cli = Cli::try_parse_from(["confidant", "search", "cat", "-k", "3", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Search { query, k } => {
                assert_eq!(query, "cat");
                assert_eq!(k, 3);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::try_parse_from([
            "confidant",
            "--llm-provider",
            "ollama",
            "--memory-path",
            "/tmp/index",
            "stats",
        ])
        .unwrap();

        let mut config = AppConfig::default();
        config.llm.model = "claude-opus".into();
        cli.overrides.apply(&mut config);
        assert_eq!(config.llm.provider, LlmProviderKind::Ollama);
        assert_eq!(config.llm.resolved_model(), "qwen3:32b");
        assert_eq!(config.memory.path, PathBuf::from("/tmp/index"));
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Local);
    }

    #[test]
    fn test_override_model_wins_over_provider_reset() {
        let overrides = ConfigOverrides {
            llm_provider: Some(LlmProviderKind::OpenAi),
            llm_model: Some("gpt-4o-mini".into()),
            ..Default::default()
        };
        let mut config = AppConfig::default();
        overrides.apply(&mut config);
        assert_eq!(config.llm.resolved_model(), "gpt-4o-mini");
    }
}
