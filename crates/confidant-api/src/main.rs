//! Confidant CLI entry point.
//!
//! Binary name: `confidant`
//!
//! Parses CLI arguments, loads configuration, initializes tracing, then
//! dispatches to the command handler. Commands that talk to the agent build
//! the providers and open the memory store first.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use confidant_observe::tracing_setup::{LogOutput, init_tracing, shutdown_tracing};
use confidant_types::config::LogFormat;

use cli::{Cli, Commands, ConfigCommand, MemoryCommand};
use state::{AppState, ResolvedConfig};

fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,confidant=debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need config or state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "confidant", &mut std::io::stdout());
        return Ok(());
    }

    let directive = filter_directive(cli.verbose, cli.quiet);

    // Config problems are reported through a temporary subscriber, since the
    // real one depends on the config's logging section.
    let resolved = {
        let bootstrap = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(confidant_observe::tracing_setup::build_filter(directive))
            .with_target(false)
            .finish();
        let _guard = tracing::subscriber::set_default(bootstrap);
        ResolvedConfig::load(cli.config.clone(), &cli.overrides).await
    };

    let output = match resolved.config.logging.format {
        LogFormat::Pretty => LogOutput::Pretty,
        LogFormat::Json => LogOutput::Json,
    };
    init_tracing(output, directive, resolved.config.logging.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli, resolved).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli, resolved: ResolvedConfig) -> anyhow::Result<()> {
    if let Commands::Config {
        action: ConfigCommand::Show,
    } = &cli.command
    {
        return cli::config::show_config(&resolved, cli.json);
    }

    let state = AppState::init(resolved).await?;

    match cli.command {
        Commands::Chat { show_memories } => {
            cli::chat::loop_runner::run_chat_loop(&state, show_memories).await?;
        }
        Commands::Stats => {
            cli::status::stats(&state, cli.json).await?;
        }
        Commands::Search { query, k } => {
            cli::memory::search(&state, &query, k, cli.json).await?;
        }
        Commands::Remember { fact } => {
            cli::memory::remember(&state, &fact, cli.json).await?;
        }
        Commands::Memory {
            action: MemoryCommand::List,
        } => {
            cli::memory::list_memories(&state, cli.json).await?;
        }
        Commands::Config { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_levels() {
        assert_eq!(filter_directive(0, true), "error");
        assert_eq!(filter_directive(0, false), "warn");
        assert_eq!(filter_directive(1, true), "info,confidant=debug");
        assert_eq!(filter_directive(3, false), "trace");
    }
}
