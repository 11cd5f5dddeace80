//! Slash command parsing and help for the chat loop.

use std::io::Write;

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Forget the current conversation (long-term memory is kept).
    Clear,
    /// Show long-term memory statistics.
    Memory,
    Search(String),
    Remember(String),
    Exit,
    /// Unknown command or missing argument; carries the message to show.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` for ordinary chat input. Bare `exit`/`quit` also end the
/// session.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
        return Some(ChatCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd.to_lowercase(), arg.trim().to_string()),
        None => (trimmed.to_lowercase(), String::new()),
    };

    let needs_arg = |arg: String, make: fn(String) -> ChatCommand, usage: &str| {
        if arg.is_empty() {
            ChatCommand::Unknown(format!("usage: {usage}"))
        } else {
            make(arg)
        }
    };

    Some(match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" => ChatCommand::Clear,
        "/memory" | "/mem" => ChatCommand::Memory,
        "/search" => needs_arg(arg, ChatCommand::Search, "/search <query>"),
        "/remember" | "/rem" => needs_arg(arg, ChatCommand::Remember, "/remember <fact>"),
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        other => ChatCommand::Unknown(format!("unknown command {other}, try /help")),
    })
}

/// Write the help text listing all available commands.
pub fn print_help(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  {}", style("Available commands:").bold())?;
    writeln!(out)?;
    let rows = [
        ("/help", "Show this help message"),
        ("/memory", "Show long-term memory statistics"),
        ("/search <query>", "Search long-term memory"),
        ("/remember <fact>", "Save a fact to memory"),
        ("/clear", "Forget this conversation (memories stay)"),
        ("/exit", "End the chat session"),
    ];
    for (cmd, help) in rows {
        writeln!(out, "  {:<18} {}", style(cmd).cyan(), help)?;
    }
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_not_command() {
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("exit strategy?"), None);
    }

    #[test]
    fn test_parse_exit_forms() {
        assert_eq!(parse("/exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("/q"), Some(ChatCommand::Exit));
        assert_eq!(parse("exit"), Some(ChatCommand::Exit));
        assert_eq!(parse("  QUIT "), Some(ChatCommand::Exit));
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("/help"), Some(ChatCommand::Help));
        assert_eq!(parse("/?"), Some(ChatCommand::Help));
        assert_eq!(parse("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse("/MEMORY"), Some(ChatCommand::Memory));
    }

    #[test]
    fn test_parse_search_and_remember() {
        assert_eq!(
            parse("/search   my cat"),
            Some(ChatCommand::Search("my cat".to_string()))
        );
        assert_eq!(
            parse("/remember Has a cat named Mochi"),
            Some(ChatCommand::Remember("Has a cat named Mochi".to_string()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        assert_eq!(
            parse("/search"),
            Some(ChatCommand::Unknown("usage: /search <query>".to_string()))
        );
        assert!(matches!(parse("/remember   "), Some(ChatCommand::Unknown(_))));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(matches!(parse("/foo"), Some(ChatCommand::Unknown(m)) if m.contains("/foo")));
    }

    #[test]
    fn test_print_help_lists_commands() {
        let mut buf = Vec::new();
        print_help(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for cmd in ["/memory", "/search", "/remember", "/clear", "/exit"] {
            assert!(text.contains(cmd), "missing {cmd}");
        }
    }
}
