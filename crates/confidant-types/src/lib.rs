//! Shared domain types for Confidant.
//!
//! This crate contains the core domain types used across the workspace:
//! conversation turns, long-term memory records, LLM request/response shapes,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
