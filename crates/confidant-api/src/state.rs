//! Application state wiring the agent together.
//!
//! `AppState` resolves the data directory and effective configuration, then
//! (for commands that need it) builds the shared agent context and session
//! service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use confidant_core::chat::service::SessionService;
use confidant_infra::config::{default_config_path, load_app_config, resolve_data_dir};
use confidant_infra::context::build_agent_context;
use confidant_types::config::AppConfig;

use crate::cli::ConfigOverrides;

/// Where configuration came from, plus its effective value.
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    pub config: AppConfig,
}

impl ResolvedConfig {
    /// Load the config file and apply command-line overrides.
    pub async fn load(
        config_path: Option<PathBuf>,
        overrides: &ConfigOverrides,
    ) -> Self {
        let data_dir = resolve_data_dir();
        let config_path = config_path.unwrap_or_else(|| default_config_path(&data_dir));
        let mut config = load_app_config(&config_path).await;
        overrides.apply(&mut config);
        Self {
            data_dir,
            config_path,
            config,
        }
    }
}

/// Shared application state for commands that talk to the agent.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SessionService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Build providers, open the memory store, wire the session service.
    pub async fn init(resolved: ResolvedConfig) -> anyhow::Result<Self> {
        let ResolvedConfig {
            data_dir, config, ..
        } = resolved;

        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let agent = build_agent_context(&config, &data_dir).await?;
        Ok(Self {
            service: Arc::new(SessionService::new(agent)),
            config: Arc::new(config),
            data_dir,
        })
    }
}
