//! System prompt composition.
//!
//! One composer serves every provider. It renders the background contexts and
//! the response-action catalog into a single system instruction and hands back
//! [`PromptTools`]: the instruction plus the extractors that understand the
//! reply schema that instruction asks for.

use thiserror::Error;

use super::context::{ChatContext, ContextError, RawChatContext};
use super::extractor::{StrictExtractor, TolerantExtractor};
use super::message::ConversationMessage;
use super::response_action::{render_response_actions, ResponseAction};
use crate::domain::foundation::Timestamp;

/// Errors raised while building a prompt. These end the turn for good.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Error creating chat prompt: {0}")]
    Context(#[from] ContextError),

    #[error(
        "Error creating chat prompt: prompt needs ~{prompt_tokens} tokens, \
         leaving no output budget within a {context_window} token window"
    )]
    TokenLimit {
        prompt_tokens: u32,
        context_window: u32,
    },

    #[error("Error creating chat prompt: No message to respond to")]
    NoMessageToRespondTo,
}

/// Version of the system prompt template.
///
/// Extractors are tied to a version because the reply schema is spelled out
/// inside the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SystemPromptVersion {
    #[default]
    V1,
}

/// Rough token estimate, ~4 characters per token.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len() / 4).max(1) as u32
}

/// Generic prompt handed to a provider adapter.
///
/// The adapter owns it: some providers consume the history while building
/// their request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system_instruction: String,
    pub history: Vec<ConversationMessage>,
}

impl ChatPrompt {
    /// Creates a prompt from an instruction and the ordered history.
    pub fn new(system_instruction: impl Into<String>, history: Vec<ConversationMessage>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            history,
        }
    }
}

/// Everything a turn needs from one rendered template.
#[derive(Debug, Clone)]
pub struct PromptTools {
    system_prompt: String,
    strict: StrictExtractor,
    tolerant: TolerantExtractor,
}

impl PromptTools {
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn strict(&self) -> &StrictExtractor {
        &self.strict
    }

    pub fn tolerant(&self) -> &TolerantExtractor {
        &self.tolerant
    }

    /// Pairs the system prompt with the conversation history.
    pub fn chat_prompt(&self, history: Vec<ConversationMessage>) -> ChatPrompt {
        ChatPrompt::new(self.system_prompt.clone(), history)
    }
}

/// Builds system prompts from one fixed template version.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer {
    version: SystemPromptVersion,
}

impl PromptComposer {
    /// Creates a composer for the given template version.
    pub fn new(version: SystemPromptVersion) -> Self {
        Self { version }
    }

    pub fn version(&self) -> SystemPromptVersion {
        self.version
    }

    /// Renders contexts and actions into the system prompt.
    ///
    /// # Errors
    ///
    /// - `PromptError::Context` if any context has an unknown tag or a value
    ///   that does not match its tag
    pub fn compose(
        &self,
        contexts: &[RawChatContext],
        actions: &[ResponseAction],
        now: Timestamp,
    ) -> Result<PromptTools, PromptError> {
        let mut context_blocks = Vec::with_capacity(contexts.len());
        for raw in contexts {
            if let Some(context) = ChatContext::from_raw(raw)? {
                let block = context.render();
                if !block.is_empty() {
                    context_blocks.push(block);
                }
            }
        }
        tracing::debug!(blocks = context_blocks.len(), "rendered context blocks");

        let action_catalog = render_response_actions(actions);
        let permitted: Vec<String> = actions.iter().map(|a| a.key.clone()).collect();

        let system_prompt = match self.version {
            SystemPromptVersion::V1 => {
                render_v1(&context_blocks.join("\n\n"), &action_catalog, now)
            }
        };

        Ok(PromptTools {
            system_prompt,
            strict: StrictExtractor::new(self.version, permitted.clone()),
            tolerant: TolerantExtractor::new(self.version, permitted),
        })
    }
}

fn render_v1(context: &str, action_catalog: &str, now: Timestamp) -> String {
    let context = if context.is_empty() {
        "No background context was provided."
    } else {
        context
    };
    let action_catalog = if action_catalog.is_empty() {
        "No response actions are available."
    } else {
        action_catalog
    };

    format!(
        "You are an automation guru helping a user describe a workflow they want automated.\n\
         Your only job in this conversation is to uncover the user's requirements by asking \
         short clarifying questions, one message at a time. Do not build anything yourself.\n\
         \n\
         Today is {weekday}, {date}.\n\
         \n\
         # Background\n\
         {context}\n\
         \n\
         # Response actions\n\
         These are the actions the team can take after your reply. Only ever name keys from this list.\n\
         {action_catalog}\n\
         \n\
         # Reply format\n\
         Reply with a single JSON object and nothing else:\n\
         {{\n\
         \x20 \"haveIAlreadyAskedTheseQuestions\": boolean, true when every question you would ask has already been answered,\n\
         \x20 \"newQuestionsToConfirmUnderstanding\": string[], the questions still open, most important first,\n\
         \x20 \"questionsAsASingleMessage\": string, the open questions phrased as one friendly message,\n\
         \x20 \"requirementsSoFar\": string, a concise summary of every requirement confirmed so far,\n\
         \x20 \"responseActions\": string[], keys of the response actions that fit this moment\n\
         }}",
        weekday = now.weekday_name(),
        date = now.to_iso_string(),
        context = context,
        action_catalog = action_catalog,
    )
}
