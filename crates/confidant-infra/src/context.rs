//! Startup wiring.
//!
//! Builds the shared [`AgentContext`] from an [`AppConfig`]: resolves the
//! configured files against the data directory, constructs the generation
//! provider and embedder once, and opens (or seeds) the memory store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use confidant_core::agent::context::{AgentContext, TurnSettings};
use confidant_core::llm::box_provider::BoxLlmProvider;
use confidant_core::memory::box_embedder::BoxEmbedder;
use confidant_core::memory::box_vector::BoxVectorMemoryStore;
use confidant_types::config::AppConfig;

use crate::config::resolve_path;
use crate::filesystem::{load_examples, load_persona, load_seed_memories};
use crate::llm::{api_key_from_env, create_provider};
use crate::vector::store::FileVectorMemoryStore;
use crate::vector::{create_embedder, embedding_key_env};

/// Construct providers from configuration and assemble the agent.
pub async fn build_agent_context(
    config: &AppConfig,
    data_dir: &Path,
) -> anyhow::Result<Arc<AgentContext>> {
    let llm_key = config
        .llm
        .resolved_api_key_env()
        .and_then(|name| api_key_from_env(&name));
    let provider = create_provider(&config.llm, llm_key).with_context(|| {
        format!(
            "failed to create {} provider (is {} set?)",
            config.llm.provider,
            config
                .llm
                .resolved_api_key_env()
                .unwrap_or_else(|| "an API key".to_string())
        )
    })?;

    let settings = config.embedding.clone();
    let embed_key = api_key_from_env(&embedding_key_env(&settings));
    let cache_dir = data_dir.join("models");
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    // Loading the local model may download it and is CPU-bound.
    let embedder = tokio::task::spawn_blocking(move || {
        create_embedder(&settings, embed_key, Some(cache_dir), timeout)
    })
    .await
    .context("embedder construction task failed")?
    .context("failed to create embedder")?;

    assemble_agent_context(config, data_dir, provider, embedder).await
}

/// Assemble the agent around already-constructed capabilities.
#[tracing::instrument(name = "assemble_agent", skip_all, fields(data_dir = %data_dir.display()))]
pub async fn assemble_agent_context(
    config: &AppConfig,
    data_dir: &Path,
    provider: BoxLlmProvider,
    embedder: BoxEmbedder,
) -> anyhow::Result<Arc<AgentContext>> {
    let agent = &config.agent;
    let resolve = |p: &Path| resolve_path(data_dir, p);

    let persona_path = agent.persona_file.as_deref().map(resolve);
    let persona = load_persona(persona_path.as_deref(), &agent.name)
        .await
        .context("failed to load persona")?;

    let examples_path = agent.examples_file.as_deref().map(resolve);
    let examples = load_examples(examples_path.as_deref())
        .await
        .context("failed to load example conversations")?;

    let seeds_path = agent.seed_memories_file.as_deref().map(resolve);
    let seeds = load_seed_memories(seeds_path.as_deref())
        .await
        .context("failed to load seed memories")?;

    let memory_path = resolve(&config.memory.path);
    let store =
        FileVectorMemoryStore::load_or_init(&memory_path, &seeds, embedder, config.memory.metric)
            .await
            .with_context(|| format!("failed to open memory store at {}", memory_path.display()))?;

    tracing::info!(
        agent = %agent.name,
        provider = provider.name(),
        examples = examples.len(),
        "Agent context ready"
    );

    Ok(Arc::new(AgentContext::new(
        provider,
        BoxVectorMemoryStore::new(store),
        persona,
        examples,
        TurnSettings::from_config(config),
    )))
}
