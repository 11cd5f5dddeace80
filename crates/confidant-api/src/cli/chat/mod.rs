//! Interactive chat REPL.
//!
//! Line-oriented loop over async readline: slash commands for memory
//! inspection, a spinner while the agent thinks, and multi-line replies
//! rendered as separate short messages. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
