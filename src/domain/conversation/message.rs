//! Conversation messages.
//!
//! Messages arrive with free-form role strings and are normalized onto the
//! three canonical roles. Order is conversation order and is never changed.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical role of a message sender.
///
/// Provider adapters translate these into their own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
}

impl Role {
    /// All canonical roles, for exhaustive checks.
    pub const ALL: [Role; 3] = [Role::System, Role::User, Role::Assistant];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    /// Parses a role name case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(ValidationError::invalid_value(
                "role",
                format!("unknown message role '{}'", s),
            )),
        }
    }
}

/// One message of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub text: String,
}

impl ConversationMessage {
    /// Creates a new message.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    /// Creates a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }
}
