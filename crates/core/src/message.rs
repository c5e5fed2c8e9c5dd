//! Turn and conversation request types.
//!
//! These are the value objects that flow through a chat exchange:
//! caller sends a `ConversationRequest` → assembler builds `Turn`s →
//! provider generates a completion.

use serde::{Deserialize, Serialize};

/// The role of a turn's speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (the domain directive)
    System,
    /// The end user
    User,
    /// The medical assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A caller's chat request: the new utterance plus everything said before it.
///
/// `message` is optional at the type level so a missing field can be
/// reported as invalid input rather than as a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRequest {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub history: Vec<Turn>,
}

impl ConversationRequest {
    pub fn new(message: impl Into<String>, history: Vec<Turn>) -> Self {
        Self {
            message: Some(message.into()),
            history,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Turn>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Turn>>::deserialize(deserializer)?.unwrap_or_default())
}
