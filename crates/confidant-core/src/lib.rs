//! Business logic and port (trait) definitions for Confidant.
//!
//! This crate defines the capability traits the infrastructure layer
//! implements (generation, embedding, vector memory) and the turn
//! orchestration built on top of them. It depends only on
//! `confidant-types` -- never on `confidant-infra` or any I/O crate.

pub mod agent;
pub mod chat;
pub mod llm;
pub mod memory;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
