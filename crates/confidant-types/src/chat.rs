//! Conversation types for Confidant.
//!
//! These types model a single session's dialogue: turns, the persona the
//! agent speaks with, and the fixed example exchanges shown to the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::llm::{Message, MessageRole};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "human" => Ok(Speaker::User),
            "agent" | "assistant" => Ok(Speaker::Agent),
            other => Err(format!("invalid speaker: '{other}'")),
        }
    }
}

impl From<Speaker> for MessageRole {
    fn from(speaker: Speaker) -> Self {
        match speaker {
            Speaker::User => MessageRole::User,
            Speaker::Agent => MessageRole::Assistant,
        }
    }
}

/// One utterance in a conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Convert to a provider message, mapping speaker to role.
    pub fn to_message(&self) -> Message {
        Message {
            role: self.speaker.into(),
            content: self.text.clone(),
        }
    }
}

/// Phase of a session's turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    #[default]
    Idle,
    Retrieving,
    Generating,
    Extracting,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnPhase::Idle => write!(f, "idle"),
            TurnPhase::Retrieving => write!(f, "retrieving"),
            TurnPhase::Generating => write!(f, "generating"),
            TurnPhase::Extracting => write!(f, "extracting"),
        }
    }
}

/// The agent's persona: base system prompt plus optional style notes.
///
/// `speaking_style` is accepted as an alias for `style_notes` so persona
/// files written for earlier builds keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub system_prompt: String,
    #[serde(default, alias = "speaking_style")]
    pub style_notes: Vec<String>,
}

impl Persona {
    /// The persona text sent as the system prompt, style notes appended.
    pub fn render(&self) -> String {
        if self.style_notes.is_empty() {
            return self.system_prompt.clone();
        }
        let mut out = self.system_prompt.clone();
        out.push_str("\n\nSpeaking style:");
        for note in &self.style_notes {
            out.push_str("\n- ");
            out.push_str(note);
        }
        out
    }
}

/// One line of an example conversation in the examples file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleLine {
    pub role: String,
    pub content: String,
}

/// One example conversation (a few alternating lines).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExampleConversation {
    #[serde(default)]
    pub conversation: Vec<ExampleLine>,
}

/// Top-level shape of the examples file: `{"examples": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExampleFile {
    #[serde(default)]
    pub examples: Vec<ExampleConversation>,
}

impl ExampleFile {
    /// Flatten every example into provider messages, in file order.
    ///
    /// Lines with a role other than user/assistant (or their aliases) are
    /// skipped.
    pub fn to_messages(&self) -> Vec<Message> {
        self.examples
            .iter()
            .flat_map(|ex| ex.conversation.iter())
            .filter_map(|line| match line.role.parse::<MessageRole>() {
                Ok(role @ (MessageRole::User | MessageRole::Assistant)) => Some(Message {
                    role,
                    content: line.content.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}
