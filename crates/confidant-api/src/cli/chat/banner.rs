//! Welcome banner display for chat sessions.

use console::style;

/// Print the banner shown before the first prompt.
pub fn print_welcome_banner(
    name: &str,
    provider: &str,
    model: &str,
    memory_count: usize,
    session_id: &str,
) {
    println!();
    println!("  {}", style(name).cyan().bold());
    println!();
    println!(
        "  {}   {} / {}",
        style("Model:").bold(),
        provider,
        style(model).dim()
    );
    println!(
        "  {}  {} facts",
        style("Memory:").bold(),
        memory_count
    );
    println!(
        "  {} {}",
        style("Session:").bold(),
        style(&session_id[..8.min(session_id.len())]).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D or /exit to leave").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
