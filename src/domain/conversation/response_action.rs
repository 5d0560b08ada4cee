//! Catalog of actions the bot is allowed to suggest.

use serde::{Deserialize, Serialize};

/// One permitted bot action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseAction {
    #[serde(rename = "responseActionKey")]
    pub key: String,
    #[serde(rename = "responseActionDescription")]
    pub description: String,
}

impl ResponseAction {
    /// Creates a new response action.
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
        }
    }

    /// Two-line block: `Key: <key>` then `- <description>`.
    pub fn render(&self) -> String {
        format!("Key: {}\n- {}", self.key, self.description)
    }
}

/// Renders the catalog in input order, one block per action.
pub fn render_response_actions(actions: &[ResponseAction]) -> String {
    actions
        .iter()
        .map(ResponseAction::render)
        .collect::<Vec<_>>()
        .join("\n")
}
