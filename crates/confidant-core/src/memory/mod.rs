//! Long-term memory ports and fact extraction for Confidant.
//!
//! This module defines the `Embedder` and `VectorMemoryStore` traits that
//! the infrastructure layer implements, their boxed wrappers, and the
//! `FactExtractor` that uses an LLM to decide which facts from an exchange
//! are worth keeping.

pub mod box_embedder;
pub mod box_vector;
pub mod embedder;
pub mod extractor;
pub mod vector;
