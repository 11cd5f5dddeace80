//! `config show`: print the effective configuration.

use anyhow::Result;
use console::style;

use crate::state::ResolvedConfig;

pub fn show_config(resolved: &ResolvedConfig, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "data_dir": resolved.data_dir,
            "config_path": resolved.config_path,
            "config": resolved.config,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let exists = resolved.config_path.exists();
    println!();
    println!(
        "  {}  {}",
        style("Data dir:").bold(),
        style(resolved.data_dir.display()).dim()
    );
    println!(
        "  {}    {} {}",
        style("Config:").bold(),
        style(resolved.config_path.display()).dim(),
        if exists {
            String::new()
        } else {
            format!("{}", style("(not found, using defaults)").yellow())
        }
    );
    println!(
        "  {}     {} / {}",
        style("Model:").bold(),
        resolved.config.llm.provider,
        style(resolved.config.llm.resolved_model()).cyan()
    );
    println!(
        "  {} {} / {}",
        style("Embedding:").bold(),
        resolved.config.embedding.provider,
        style(resolved.config.embedding.resolved_model()).cyan()
    );
    println!();
    print!("{}", toml::to_string_pretty(&resolved.config)?);
    println!();
    Ok(())
}
