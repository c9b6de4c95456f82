//! Caller-facing messages and provider-facing turns

use serde::{Deserialize, Serialize};

/// Role of an incoming chat message.
///
/// Any role string other than `user` or `assistant` deserializes into
/// [`MessageRole::Unrecognized`], which the normalizer drops.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MessageRole {
    User,
    Assistant,
    Unrecognized(String),
}

impl From<String> for MessageRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            _ => MessageRole::Unrecognized(role),
        }
    }
}

impl From<&str> for MessageRole {
    fn from(role: &str) -> Self {
        MessageRole::from(role.to_string())
    }
}

/// A single chat message as sent by the caller
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<MessageRole>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Role of a provider-facing turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One text part of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A role-tagged unit of conversation content (Gemini `Content`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            parts: vec![Part::text(text)],
        }
    }
}

/// The ordered turns sent to the provider for one generation request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Total number of parts across all turns
    pub fn part_count(&self) -> usize {
        self.turns.iter().map(|t| t.parts.len()).sum()
    }

    /// True if two neighbouring turns both have the `user` role, which the
    /// provider rejects.
    pub fn has_adjacent_user_turns(&self) -> bool {
        self.turns
            .windows(2)
            .any(|w| w[0].role == TurnRole::User && w[1].role == TurnRole::User)
    }
}
