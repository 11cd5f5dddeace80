//! Memory CLI commands: list, search, remember.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::state::AppState;

/// List every stored fact with its provenance.
///
/// ```bash
/// confidant memory list
/// confidant memory list --json
/// ```
pub async fn list_memories(state: &AppState, json: bool) -> Result<()> {
    let records = state.service.records().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!(
            "  {} No memories yet. Facts are extracted from conversations.",
            style("i").blue().bold(),
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Fact").fg(Color::White),
        Cell::new("Topic").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Source").fg(Color::White),
        Cell::new("Created").fg(Color::White),
    ]);

    for record in &records {
        let source_color = match record.source {
            confidant_types::memory::MemorySource::Initial => Color::Blue,
            confidant_types::memory::MemorySource::Conversation => Color::Green,
        };
        table.add_row(vec![
            Cell::new(&record.fact),
            Cell::new(record.topic.as_deref().unwrap_or("-")),
            Cell::new(record.confidence.to_string()),
            Cell::new(record.source.to_string()).fg(source_color),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {} {} facts",
        style("Total:").bold(),
        records.len()
    );
    println!();
    Ok(())
}

/// Similarity search over long-term memory.
pub async fn search(state: &AppState, query: &str, k: usize, json: bool) -> Result<()> {
    let facts = state.service.search_memory(query, k).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&facts)?);
        return Ok(());
    }

    println!();
    if facts.is_empty() {
        println!("  {} No matching memories.", style("i").blue().bold());
    } else {
        for (i, fact) in facts.iter().enumerate() {
            println!("  {} {}", style(format!("{}.", i + 1)).dim(), fact);
        }
    }
    println!();
    Ok(())
}

/// Store a fact directly.
pub async fn remember(state: &AppState, fact: &str, json: bool) -> Result<()> {
    if fact.trim().is_empty() {
        anyhow::bail!("fact must not be empty");
    }
    let record = state
        .service
        .remember(fact)
        .await
        .context("failed to store fact")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!();
        println!(
            "  {} Remembered: {}",
            style("✓").green().bold(),
            style(&record.fact).cyan()
        );
        println!();
    }
    Ok(())
}
