//! Main chat loop.
//!
//! Reads lines, dispatches slash commands, and submits everything else as a
//! turn to the session service. A failed turn leaves the conversation as it
//! was before the message, so the user can simply retry.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use uuid::Uuid;

use super::banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use crate::state::AppState;

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Write a reply as one short message per line.
fn write_reply(out: &mut impl Write, name: &str, reply: &str) -> std::io::Result<()> {
    let lines: Vec<&str> = reply
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        writeln!(out, "  {} {}", style(format!("{name}>")).cyan().bold(), style("...").dim())?;
    }
    for line in lines {
        writeln!(out, "  {} {}", style(format!("{name}>")).cyan().bold(), line)?;
    }
    Ok(())
}

/// Run an interactive session until the user exits.
pub async fn run_chat_loop(state: &AppState, show_memories: bool) -> Result<()> {
    let session_id = Uuid::now_v7().to_string();
    let name = state.config.agent.name.clone();
    let stats = state.service.stats().await;

    banner::print_welcome_banner(
        &name,
        &state.config.llm.provider.to_string(),
        &state.config.llm.resolved_model(),
        stats.record_count,
        &session_id,
    );

    let (mut input, mut out) = ChatInput::new(format!("{} ", style("you>").green().bold()))
        .context("failed to initialize terminal input")?;

    loop {
        let text = match input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                writeln!(out, "  {}", style("(Ctrl+D or /exit to leave)").dim())?;
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(command) = commands::parse(&text) {
            match command {
                ChatCommand::Help => commands::print_help(&mut out)?,
                ChatCommand::Exit => break,
                ChatCommand::Clear => {
                    state.service.reset(&session_id).await;
                    writeln!(out, "  {}", style("Conversation cleared.").dim())?;
                }
                ChatCommand::Memory => {
                    let stats = state.service.stats().await;
                    writeln!(
                        out,
                        "  {} {} facts in long-term memory",
                        style("Memory:").bold(),
                        stats.record_count
                    )?;
                }
                ChatCommand::Search(query) => {
                    let k = state.config.agent.retrieval_top_k;
                    let facts = state.service.search_memory(&query, k).await;
                    if facts.is_empty() {
                        writeln!(out, "  {}", style("No matching memories.").dim())?;
                    }
                    for (i, fact) in facts.iter().enumerate() {
                        writeln!(out, "  {} {}", style(format!("{}.", i + 1)).dim(), fact)?;
                    }
                }
                ChatCommand::Remember(fact) => match state.service.remember(&fact).await {
                    Ok(record) => writeln!(
                        out,
                        "  {} Remembered: {}",
                        style("✓").green().bold(),
                        style(&record.fact).cyan()
                    )?,
                    Err(e) => writeln!(
                        out,
                        "  {} Could not save: {e}",
                        style("✗").red().bold()
                    )?,
                },
                ChatCommand::Unknown(message) => {
                    writeln!(out, "  {}", style(message).yellow())?;
                }
            }
            continue;
        }

        let spinner = thinking_spinner();
        let result = state.service.submit(&session_id, &text).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => {
                if show_memories {
                    for fact in state.service.last_retrieved(&session_id).await {
                        writeln!(out, "  {} {}", style("recalled:").dim(), style(fact).dim())?;
                    }
                }
                write_reply(&mut out, &name, &reply)?;
            }
            Err(e) => {
                tracing::debug!(error = ?e, "Turn failed");
                writeln!(
                    out,
                    "  {} {e} (your message was not kept, try again)",
                    style("✗").red().bold()
                )?;
            }
        }
    }

    input.flush();
    // Let any background extraction for the last exchange land.
    state.service.end_session(&session_id).await;
    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}
