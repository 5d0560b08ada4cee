//! Structured outcome of one turn.

use serde::Serialize;

/// Sent when extraction produced no text for the user.
pub const DEFAULT_MESSAGE_TO_USER: &str =
    "Sorry, I didn't quite catch that. Could you tell me a bit more about what you'd like to automate?";

/// What the assistant says and suggests at the end of a turn.
///
/// # Invariants
///
/// - `message_to_user` is never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTurn {
    requirements_so_far: String,
    message_to_user: String,
    response_actions: Vec<String>,
}

impl ExtractedTurn {
    /// Creates a turn, substituting the default message for an empty one.
    pub fn new(
        requirements_so_far: impl Into<String>,
        message_to_user: impl Into<String>,
        response_actions: Vec<String>,
    ) -> Self {
        let message_to_user = message_to_user.into();
        let message_to_user = if message_to_user.trim().is_empty() {
            DEFAULT_MESSAGE_TO_USER.to_string()
        } else {
            message_to_user
        };

        Self {
            requirements_so_far: requirements_so_far.into(),
            message_to_user,
            response_actions,
        }
    }

    /// Shorthand for a turn that only carries a message.
    pub fn message(message_to_user: impl Into<String>) -> Self {
        Self::new("", message_to_user, Vec::new())
    }

    pub fn requirements_so_far(&self) -> &str {
        &self.requirements_so_far
    }

    pub fn message_to_user(&self) -> &str {
        &self.message_to_user
    }

    pub fn response_actions(&self) -> &[String] {
        &self.response_actions
    }
}
