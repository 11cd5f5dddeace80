//! Infrastructure layer for Confidant.
//!
//! Contains implementations of the capability traits defined in
//! `confidant-core`: the file-backed vector memory store, embedding backends
//! (local fastembed model, OpenAI-compatible endpoints), LLM providers
//! (Anthropic, OpenAI-compatible), plus configuration and resource loading
//! and the startup wiring that ties them into an `AgentContext`.

pub mod config;
pub mod context;
pub mod filesystem;
pub mod llm;
pub mod vector;
