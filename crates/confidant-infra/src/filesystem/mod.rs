//! Filesystem adapters for Confidant.
//!
//! Loads the JSON resource files the agent is configured from: the persona,
//! the fixed example conversations, and the seed memories used to initialize
//! a fresh store. A missing optional file is not an error; a named file that
//! cannot be read or parsed is.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use confidant_types::chat::{ExampleFile, Persona};
use confidant_types::llm::Message;
use confidant_types::memory::{SeedMemory, SeedMemoryFile};

/// Failure to load a configured resource file.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ResourceError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ResourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| ResourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persona used when no persona file is configured.
pub fn default_persona(agent_name: &str) -> Persona {
    Persona {
        system_prompt: format!(
            "You are {agent_name}, chatting with a close friend. Keep replies short and casual, \
             like text messages. Never describe yourself as an AI or a language model. \
             If long-term memories about your friend are provided, bring them up naturally \
             when they fit, not every time."
        ),
        style_notes: Vec::new(),
    }
}

/// Load the persona from `path`, or the default persona when `path` is `None`.
pub async fn load_persona(path: Option<&Path>, agent_name: &str) -> Result<Persona, ResourceError> {
    match path {
        Some(path) => {
            let persona: Persona = read_json(path).await?;
            tracing::debug!(path = %path.display(), notes = persona.style_notes.len(), "Loaded persona");
            Ok(persona)
        }
        None => Ok(default_persona(agent_name)),
    }
}

/// Load the example conversations as provider messages, in file order.
pub async fn load_examples(path: Option<&Path>) -> Result<Vec<Message>, ResourceError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let file: ExampleFile = read_json(path).await?;
    let messages = file.to_messages();
    tracing::debug!(
        path = %path.display(),
        conversations = file.examples.len(),
        messages = messages.len(),
        "Loaded example conversations"
    );
    Ok(messages)
}

/// Load seed memories.
///
/// A configured path that does not exist yields no seeds with a warning: the
/// store starts empty rather than refusing to start.
pub async fn load_seed_memories(path: Option<&Path>) -> Result<Vec<SeedMemory>, ResourceError> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!(path = %path.display(), "Seed memory file not found, starting without seeds");
        return Ok(Vec::new());
    }
    let file: SeedMemoryFile = read_json(path).await?;
    Ok(file.memories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidant_types::llm::MessageRole;
    use confidant_types::memory::Confidence;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_persona_default_when_unconfigured() {
        let persona = load_persona(None, "Raymond").await.unwrap();
        assert!(persona.system_prompt.starts_with("You are Raymond"));
        assert!(persona.style_notes.is_empty());
    }

    #[tokio::test]
    async fn test_load_persona_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persona.json");
        tokio::fs::write(
            &path,
            r#"{"system_prompt": "You are Raymond.", "style_notes": ["short messages"]}"#,
        )
        .await
        .unwrap();

        let persona = load_persona(Some(&path), "ignored").await.unwrap();
        assert_eq!(persona.system_prompt, "You are Raymond.");
        assert_eq!(persona.style_notes, vec!["short messages"]);
    }

    #[tokio::test]
    async fn test_load_persona_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = load_persona(Some(&dir.path().join("nope.json")), "Raymond")
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_examples_maps_human_and_skips_unknown_roles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("examples.json");
        tokio::fs::write(
            &path,
            r#"{"examples": [
                {"conversation": [
                    {"role": "human", "content": "you up?"},
                    {"role": "assistant", "content": "ya"},
                    {"role": "narrator", "content": "ignored"}
                ]},
                {"conversation": [{"role": "human", "content": "lunch?"}]}
            ]}"#,
        )
        .await
        .unwrap();

        let messages = load_examples(Some(&path)).await.unwrap();
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(messages[2].content, "lunch?");
    }

    #[tokio::test]
    async fn test_load_examples_bad_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("examples.json");
        tokio::fs::write(&path, "{\"examples\": [").await.unwrap();
        assert!(matches!(
            load_examples(Some(&path)).await.unwrap_err(),
            ResourceError::Parse { .. }
        ));
    }

    #[tokio::test]
    async fn test_load_seed_memories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memories.json");
        tokio::fs::write(
            &path,
            r#"{"memories": [
                {"fact": "Works as a nurse", "topic": "work", "confidence": "high"},
                {"fact": "Lives near the sea"}
            ]}"#,
        )
        .await
        .unwrap();

        let seeds = load_seed_memories(Some(&path)).await.unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].confidence, Some(Confidence::High));
        assert_eq!(seeds[1].topic, None);
    }

    #[tokio::test]
    async fn test_load_seed_memories_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let seeds = load_seed_memories(Some(&dir.path().join("absent.json")))
            .await
            .unwrap();
        assert!(seeds.is_empty());
        assert!(load_seed_memories(None).await.unwrap().is_empty());
    }
}
