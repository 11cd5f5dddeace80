//! Memory types for Confidant.
//!
//! These types model the agent's long-term memory: facts about the user
//! that persist across conversations, either seeded at store creation or
//! extracted from completed exchanges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// How much a memory record is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("invalid confidence: '{other}'")),
        }
    }
}

/// Where a memory record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    /// Loaded from the seed file when the store was first created.
    Initial,
    /// Extracted from a live conversation.
    Conversation,
}

impl fmt::Display for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemorySource::Initial => write!(f, "initial"),
            MemorySource::Conversation => write!(f, "conversation"),
        }
    }
}

impl FromStr for MemorySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initial" => Ok(MemorySource::Initial),
            "conversation" => Ok(MemorySource::Conversation),
            other => Err(format!("invalid memory source: '{other}'")),
        }
    }
}

/// A single long-term memory record.
///
/// Records are append-only: once created they are never mutated.
/// The embedding is kept out of this struct; the store owns vectors
/// alongside records in its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub fact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub confidence: Confidence,
    pub source: MemorySource,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// A record extracted from conversation (medium confidence).
    pub fn from_conversation(fact: impl Into<String>, topic: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            fact: fact.into(),
            topic,
            confidence: Confidence::Medium,
            source: MemorySource::Conversation,
            created_at: Utc::now(),
        }
    }

    /// A record built from seed input.
    pub fn from_seed(seed: &SeedMemory) -> Self {
        Self {
            id: Uuid::now_v7(),
            fact: seed.fact.clone(),
            topic: seed.topic.clone(),
            confidence: seed.confidence.unwrap_or_default(),
            source: MemorySource::Initial,
            created_at: Utc::now(),
        }
    }
}

/// Seed memory entry, as found in the seed JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedMemory {
    pub fact: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

/// Top-level shape of the seed memory file: `{"memories": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedMemoryFile {
    #[serde(default)]
    pub memories: Vec<SeedMemory>,
}

/// Similarity metric used for vector search.
///
/// Every metric is oriented so that a higher score means more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Dot,
    Euclidean,
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMetric::Cosine => write!(f, "cosine"),
            SimilarityMetric::Dot => write!(f, "dot"),
            SimilarityMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "dot" | "dotproduct" | "dot_product" => Ok(SimilarityMetric::Dot),
            "euclidean" | "l2" => Ok(SimilarityMetric::Euclidean),
            other => Err(format!("invalid similarity metric: '{other}'")),
        }
    }
}

/// A fact returned from a similarity search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFact {
    pub fact: String,
    pub score: f32,
}
