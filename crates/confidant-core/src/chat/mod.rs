//! Session-level conversation state and the session-facing service.
//!
//! - `ShortTermContext`: full transcript with a bounded read-time window
//! - `SessionService`: one orchestrator per session id over a shared context

pub mod context;
pub mod service;
