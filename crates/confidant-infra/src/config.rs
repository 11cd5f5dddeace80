//! Application configuration loader for Confidant.
//!
//! Reads `confidant.toml` (from the data directory unless a path is given)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use confidant_types::config::AppConfig;

pub const CONFIG_FILE: &str = "confidant.toml";

/// Resolve the data directory.
///
/// Priority:
/// 1. `CONFIDANT_DATA_DIR` environment variable
/// 2. `~/.confidant`
/// 3. `.confidant` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CONFIDANT_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".confidant");
    }
    PathBuf::from(".confidant")
}

/// `{data_dir}/confidant.toml`
pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Resolve a configured path: absolute paths are kept, relative ones are
/// taken relative to `data_dir`.
pub fn resolve_path(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

/// Load configuration from `config_path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to read or parse, logs a warning and
///   returns the default.
pub async fn load_app_config(config_path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_types::config::{EmbeddingProviderKind, LlmProviderKind};
    use confidant_types::memory::SimilarityMetric;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_app_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_app_config(&default_config_path(tmp.path())).await;
        assert_eq!(config.agent.name, "Raymond");
        assert_eq!(config.llm.provider, LlmProviderKind::Anthropic);
    }

    #[tokio::test]
    async fn load_app_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = default_config_path(tmp.path());
        tokio::fs::write(
            &path,
            r#"
[agent]
name = "Ray"
short_term_rounds = 4
background_extraction = true

[llm]
provider = "ollama"
model = "llama3.1"

[embedding]
provider = "openai"

[memory]
path = "/var/lib/confidant/index"
metric = "dot"
"#,
        )
        .await
        .unwrap();

        let config = load_app_config(&path).await;
        assert_eq!(config.agent.name, "Ray");
        assert_eq!(config.agent.short_term_rounds, 4);
        assert_eq!(config.agent.retrieval_top_k, 5);
        assert!(config.agent.background_extraction);
        assert_eq!(config.llm.provider, LlmProviderKind::Ollama);
        assert_eq!(config.llm.resolved_model(), "llama3.1");
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAi);
        assert_eq!(config.memory.metric, SimilarityMetric::Dot);
    }

    #[tokio::test]
    async fn load_app_config_malformed_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = default_config_path(tmp.path());
        tokio::fs::write(&path, "[agent\nname = ").await.unwrap();

        let config = load_app_config(&path).await;
        assert_eq!(config.agent.short_term_rounds, 20);
    }

    #[test]
    fn resolve_path_relative_and_absolute() {
        let data = Path::new("/data");
        assert_eq!(
            resolve_path(data, Path::new("memory_index")),
            PathBuf::from("/data/memory_index")
        );
        assert_eq!(
            resolve_path(data, Path::new("/elsewhere/index")),
            PathBuf::from("/elsewhere/index")
        );
    }
}
