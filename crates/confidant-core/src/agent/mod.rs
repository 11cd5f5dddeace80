//! Agent wiring: the startup context, prompt assembly, and the per-session
//! turn state machine.

pub mod context;
pub mod orchestrator;
pub mod prompt;
