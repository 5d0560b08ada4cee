//! Inbound and outbound turn envelopes.
//!
//! The inbound body is checked once, up front, and normalized into a
//! [`TurnRequest`]. A turn ends with either a [`BotResponseEvent`] or a
//! [`BotErrorEvent`], both delivered over the same channel.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::context::{ContextType, RawChatContext};
use super::message::{ConversationMessage, Role};
use super::response_action::ResponseAction;
use super::turn::ExtractedTurn;
use crate::domain::foundation::{ErrorKind, ValidationError};

const REDACTED: &str = "REDACTED";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboundBody {
    authorization: String,
    conversation_id: String,
    message_history: Vec<InboundMessage>,
    #[serde(default)]
    extra_context: Vec<RawChatContext>,
    #[serde(default)]
    possible_response_actions: Vec<ResponseAction>,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    role: String,
    text: String,
}

/// A validated inbound message.
#[derive(Clone, PartialEq)]
pub struct TurnRequest {
    pub authorization: String,
    pub conversation_id: String,
    pub message_history: Vec<ConversationMessage>,
    pub extra_context: Vec<RawChatContext>,
    pub possible_response_actions: Vec<ResponseAction>,
}

impl TurnRequest {
    /// Validates an inbound body and normalizes message roles.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if a required field is missing or mistyped, or a
    ///   message carries an unknown role
    pub fn from_json(body: JsonValue) -> Result<Self, ValidationError> {
        let inbound: InboundBody = serde_json::from_value(body)
            .map_err(|e| ValidationError::invalid_value("body", e.to_string()))?;

        let message_history = inbound
            .message_history
            .into_iter()
            .enumerate()
            .map(|(i, message)| {
                let role = message
                    .role
                    .parse::<Role>()
                    .map_err(|e| e.within(&format!("messageHistory[{}]", i)))?;
                Ok::<_, ValidationError>(ConversationMessage::new(role, message.text))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self {
            authorization: inbound.authorization,
            conversation_id: inbound.conversation_id,
            message_history,
            extra_context: inbound.extra_context,
            possible_response_actions: inbound.possible_response_actions,
        })
    }
}

impl fmt::Debug for TurnRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnRequest")
            .field("authorization", &REDACTED)
            .field("conversation_id", &self.conversation_id)
            .field("message_history", &self.message_history)
            .field("extra_context", &self.extra_context)
            .field("possible_response_actions", &self.possible_response_actions)
            .finish()
    }
}

/// The assistant's new message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub role: Role,
    pub text: String,
}

/// Published when a turn completes.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotResponseEvent {
    pub authorization: String,
    pub conversation_id: String,
    pub new_message: OutboundMessage,
    pub response_actions: Vec<String>,
    pub contexts: Vec<RawChatContext>,
}

impl BotResponseEvent {
    /// Shapes the outbound message from the request and the extracted turn.
    ///
    /// Requirements gathered in this turn replace any inbound requirements
    /// context; every other tagged context is passed through unchanged.
    pub fn from_turn(request: &TurnRequest, turn: &ExtractedTurn) -> Self {
        let mut contexts = Vec::new();
        if !turn.requirements_so_far().is_empty() {
            contexts.push(RawChatContext::new(
                ContextType::Requirements,
                JsonValue::String(turn.requirements_so_far().to_string()),
            ));
        }
        contexts.extend(
            request
                .extra_context
                .iter()
                .filter(|c| c.context_type.is_some() && !c.is(ContextType::Requirements))
                .cloned(),
        );

        Self {
            authorization: request.authorization.clone(),
            conversation_id: request.conversation_id.clone(),
            new_message: OutboundMessage {
                role: Role::Assistant,
                text: turn.message_to_user().to_string(),
            },
            response_actions: turn.response_actions().to_vec(),
            contexts,
        }
    }
}

impl fmt::Debug for BotResponseEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotResponseEvent")
            .field("authorization", &REDACTED)
            .field("conversation_id", &self.conversation_id)
            .field("new_message", &self.new_message)
            .field("response_actions", &self.response_actions)
            .field("contexts", &self.contexts)
            .finish()
    }
}

/// Published when a turn ends with a terminal error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotErrorEvent {
    pub error: String,
    pub error_type: ErrorKind,
    pub message_body: String,
}

impl BotErrorEvent {
    /// Creates an error event carrying the original inbound body.
    pub fn new(error: impl Into<String>, error_type: ErrorKind, message_body: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_type,
            message_body: message_body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> JsonValue {
        json!({
            "authorization": "Bearer secret-token",
            "conversationId": "conv-1",
            "messageHistory": [
                {"role": "USER", "text": "hi"},
                {"role": "assistant", "text": "hello"}
            ],
            "extraContext": [
                {"contextType": "REQUIREMENTS", "value": "old requirements"},
                {"contextType": "WORKFLOW_DEFINITION", "value": {"workflowId": "wf", "workflowDescription": "d"}}
            ],
            "possibleResponseActions": [
                {"responseActionKey": "CREATE_FLOW", "responseActionDescription": "Create"}
            ]
        })
    }

    #[test]
    fn parses_and_normalizes_roles() {
        let request = TurnRequest::from_json(body()).unwrap();
        assert_eq!(request.conversation_id, "conv-1");
        assert_eq!(
            request.message_history,
            vec![ConversationMessage::user("hi"), ConversationMessage::assistant("hello")]
        );
        assert_eq!(request.extra_context.len(), 2);
        assert_eq!(request.possible_response_actions.len(), 1);
    }

    #[test]
    fn missing_conversation_id_is_rejected() {
        let mut b = body();
        b.as_object_mut().unwrap().remove("conversationId");
        let err = TurnRequest::from_json(b).unwrap_err();
        assert!(err.to_string().contains("conversationId"), "{err}");
    }

    #[test]
    fn optional_lists_default_to_empty() {
        let request = TurnRequest::from_json(json!({
            "authorization": "a",
            "conversationId": "c",
            "messageHistory": [{"role": "user", "text": "hi"}]
        }))
        .unwrap();
        assert!(request.extra_context.is_empty());
        assert!(request.possible_response_actions.is_empty());
    }

    #[test]
    fn unknown_role_names_the_message() {
        let mut b = body();
        b["messageHistory"][1]["role"] = json!("bot");
        let err = TurnRequest::from_json(b).unwrap_err();
        assert_eq!(err.field(), "messageHistory[1].role");
    }

    #[test]
    fn debug_output_redacts_authorization() {
        let request = TurnRequest::from_json(body()).unwrap();
        let rendered = format!("{:?}", request);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn response_event_replaces_requirements_and_passes_other_contexts() {
        let request = TurnRequest::from_json(body()).unwrap();
        let turn = ExtractedTurn::new("new requirements", "Which sheet?", vec![]);

        let event = BotResponseEvent::from_turn(&request, &turn);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["newMessage"], json!({"role": "assistant", "text": "Which sheet?"}));
        assert_eq!(json["contexts"][0], json!({"contextType": "REQUIREMENTS", "value": "new requirements"}));
        assert_eq!(json["contexts"][1]["contextType"], "WORKFLOW_DEFINITION");
        assert_eq!(json["contexts"].as_array().unwrap().len(), 2);
        assert_eq!(json["authorization"], "Bearer secret-token");
    }

    #[test]
    fn error_event_serializes_wire_names() {
        let event = BotErrorEvent::new("bad body", ErrorKind::RequestBodyValidation, "{}");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"error": "bad body", "errorType": "RequestBodyValidationError", "messageBody": "{}"})
        );
    }
}
