//! `stats`: memory store and session counters.

use anyhow::Result;
use console::style;

use confidant_infra::config::resolve_path;

use crate::state::AppState;

pub async fn stats(state: &AppState, json: bool) -> Result<()> {
    let stats = state.service.stats().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!();
    println!(
        "  {}  {}",
        style("Agent:").bold(),
        style(&state.config.agent.name).cyan().bold()
    );
    println!(
        "  {}  {} facts",
        style("Memory:").bold(),
        stats.record_count
    );
    println!(
        "  {}   {}",
        style("Store:").bold(),
        style(resolve_path(&state.data_dir, &state.config.memory.path).display()).dim()
    );
    println!();
    Ok(())
}
