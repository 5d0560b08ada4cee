//! Command handlers.

mod conversation_turn;

pub use conversation_turn::{ConversationTurnHandler, EventRouting, TurnError, TurnOutcome};
