//! Conversation domain module.
//!
//! Everything one turn needs that does not touch the network: contexts,
//! messages, the action catalog, prompt composition, reply extraction, and
//! the inbound/outbound envelopes.

mod context;
mod envelope;
mod extractor;
mod message;
mod prompt;
mod response_action;
mod turn;

pub use context::{
    ChatContext, ContextError, ContextType, RawChatContext, WorkflowDefinition,
    REQUIREMENTS_HEADING, WORKFLOW_DEFINITION_HEADING, WORKFLOW_DESCRIPTION_MISSING,
};
pub use envelope::{BotErrorEvent, BotResponseEvent, OutboundMessage, TurnRequest};
pub use extractor::{
    ExtractionError, ExtractionMode, StrictExtractor, TolerantExtractor, NO_FURTHER_QUESTIONS,
    READY_TO_BUILD,
};
pub use message::{ConversationMessage, Role};
pub use prompt::{
    estimate_tokens, ChatPrompt, PromptComposer, PromptError, PromptTools, SystemPromptVersion,
};
pub use response_action::{render_response_actions, ResponseAction};
pub use turn::{ExtractedTurn, DEFAULT_MESSAGE_TO_USER};
