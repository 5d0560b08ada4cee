//! Integration tests for a full conversation turn.
//!
//! Drives `ConversationTurnHandler` through the public API with the mock
//! provider and the in-memory bus, plus the real provider adapters where a
//! turn must fail before any request is sent.

use chrono::{TimeZone, Utc};
use secrecy::SecretString;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use flow_guide_conversation::adapters::ai::{
    GeminiConfig, GeminiProvider, GeminiVariant, MockChatProvider, OpenAIConfig, OpenAIProvider,
};
use flow_guide_conversation::adapters::InMemoryEventBus;
use flow_guide_conversation::application::{
    ConversationTurnHandler, EventRouting, TurnOutcome,
};
use flow_guide_conversation::domain::conversation::{ExtractionMode, NO_FURTHER_QUESTIONS};
use flow_guide_conversation::domain::foundation::{ErrorKind, Timestamp};
use flow_guide_conversation::ports::{AIError, ChatCompletion};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SOURCE: &str = "flow-guide.conversation";
const DETAIL_TYPE: &str = "botResponseMessage";

/// Nothing listens here; a request that got this far would fail as a network error.
const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

fn fixed_clock() -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 6, 14, 12, 0, 0).unwrap())
}

fn handler_with(
    provider: Arc<dyn ChatCompletion>,
    bus: Arc<InMemoryEventBus>,
) -> ConversationTurnHandler {
    ConversationTurnHandler::new(provider, bus, EventRouting::new(SOURCE, DETAIL_TYPE))
        .with_clock(fixed_clock)
}

fn minimal_body() -> JsonValue {
    json!({
        "authorization": "Bearer user-token",
        "conversationId": "conv-42",
        "messageHistory": [{"role": "user", "text": "hi"}],
        "extraContext": [],
        "possibleResponseActions": []
    })
}

fn rich_body() -> JsonValue {
    json!({
        "authorization": "Bearer user-token",
        "conversationId": "conv-42",
        "messageHistory": [
            {"role": "user", "text": "I want new leads emailed to me"},
            {"role": "assistant", "text": "Where do the leads come from?"},
            {"role": "user", "text": "A web form"}
        ],
        "extraContext": [
            {"contextType": "REQUIREMENTS", "value": "Email new leads"},
            {"contextType": "WORKFLOW_DEFINITION", "value": {
                "workflowId": "wf-1",
                "workflowDescription": "Sends an email"
            }},
            {"contextType": "WORKFLOW_RUN_INSTANCE", "value": {"runId": "run-9"}}
        ],
        "possibleResponseActions": [
            {"responseActionKey": "BUILD_FLOW", "responseActionDescription": "Build the flow"},
            {"responseActionKey": "EDIT_FLOW", "responseActionDescription": "Edit the flow"}
        ]
    })
}

fn expect_rejected(outcome: TurnOutcome) -> flow_guide_conversation::domain::conversation::BotErrorEvent {
    match outcome {
        TurnOutcome::Rejected(event) => event,
        other => panic!("expected an error event, got {:?}", other),
    }
}

// =============================================================================
// Successful turns
// =============================================================================

#[tokio::test]
async fn strict_reply_with_done_flag_publishes_no_further_questions() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = MockChatProvider::new()
        .with_reply(r#"{"haveIAlreadyAskedTheseQuestions":true}"#);

    let outcome = handler_with(Arc::new(provider), bus.clone())
        .handle(minimal_body())
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::Responded(_)));
    let events = bus.published_events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].source, SOURCE);
    assert_eq!(events[0].detail_type, DETAIL_TYPE);
    assert_eq!(events[0].detail["newMessage"]["text"], NO_FURTHER_QUESTIONS);
    assert_eq!(events[0].detail["newMessage"]["role"], "assistant");
    assert_eq!(events[0].detail["authorization"], "Bearer user-token");
}

#[tokio::test]
async fn strict_reply_asks_first_open_question_and_carries_contexts() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = MockChatProvider::new().with_reply(
        json!({
            "haveIAlreadyAskedTheseQuestions": false,
            "newQuestionsToConfirmUnderstanding": ["Which form tool?", "How often?"],
            "requirementsSoFar": "Email leads from a web form",
            "responseActions": ["EDIT_FLOW", "DELETE_EVERYTHING"]
        })
        .to_string(),
    );

    handler_with(Arc::new(provider), bus.clone())
        .handle(rich_body())
        .await
        .unwrap();

    let detail = &bus.published_events()[0].detail;
    assert_eq!(detail["newMessage"]["text"], "Which form tool?");
    assert_eq!(detail["responseActions"], json!(["EDIT_FLOW"]));
    assert_eq!(
        detail["contexts"],
        json!([
            {"contextType": "REQUIREMENTS", "value": "Email leads from a web form"},
            {"contextType": "WORKFLOW_DEFINITION", "value": {
                "workflowId": "wf-1",
                "workflowDescription": "Sends an email"
            }},
            {"contextType": "WORKFLOW_RUN_INSTANCE", "value": {"runId": "run-9"}}
        ])
    );
}

#[tokio::test]
async fn tolerant_reply_finds_object_inside_prose() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = MockChatProvider::new()
        .with_extraction_mode(ExtractionMode::Tolerant)
        .with_reply(
            "Here you go:\n{\"haveIAlreadyAskedTheseQuestions\": false, \
             \"questionsAsASingleMessage\": \"Which form tool do you use?\", \
             \"responseActions\": [\"BUILD_FLOW\"]}\nThanks!",
        );

    handler_with(Arc::new(provider), bus.clone())
        .handle(rich_body())
        .await
        .unwrap();

    let detail = &bus.published_events()[0].detail;
    assert_eq!(detail["newMessage"]["text"], "Which form tool do you use?");
    assert_eq!(detail["responseActions"], json!(["BUILD_FLOW"]));
}

#[tokio::test]
async fn identical_inputs_give_identical_messages() {
    let reply = r#"{"haveIAlreadyAskedTheseQuestions":false,"newQuestionsToConfirmUnderstanding":["Why?"]}"#;
    let mut outputs = Vec::new();

    for _ in 0..2 {
        let bus = Arc::new(InMemoryEventBus::new());
        let provider = MockChatProvider::new().with_reply(reply);
        let probe = provider.clone();

        handler_with(Arc::new(provider), bus.clone())
            .handle(rich_body())
            .await
            .unwrap();

        let detail = bus.published_events()[0].detail.clone();
        outputs.push((detail, probe.get_calls()));
    }

    assert_eq!(outputs[0].0, outputs[1].0);
    assert_eq!(outputs[0].1, outputs[1].1);
}

// =============================================================================
// Terminal failures
// =============================================================================

#[tokio::test]
async fn missing_conversation_id_publishes_validation_error() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut body = minimal_body();
    body.as_object_mut().unwrap().remove("conversationId");

    let outcome = handler_with(Arc::new(MockChatProvider::new()), bus.clone())
        .handle(body)
        .await
        .unwrap();

    let event = expect_rejected(outcome);
    assert_eq!(event.error_type, ErrorKind::RequestBodyValidation);

    let detail = &bus.published_events()[0].detail;
    assert_eq!(detail["errorType"], "RequestBodyValidationError");
    let echoed: JsonValue = serde_json::from_str(detail["messageBody"].as_str().unwrap()).unwrap();
    assert_eq!(echoed["messageHistory"][0]["text"], "hi");
}

#[tokio::test]
async fn unparseable_body_publishes_parse_error() {
    let bus = Arc::new(InMemoryEventBus::new());

    let outcome = handler_with(Arc::new(MockChatProvider::new()), bus.clone())
        .handle_raw("conversationId=conv-42")
        .await
        .unwrap();

    let event = expect_rejected(outcome);
    assert_eq!(event.error_type, ErrorKind::BodyJsonParse);
    assert_eq!(
        bus.published_events()[0].detail["messageBody"],
        "conversationId=conv-42"
    );
}

#[tokio::test]
async fn error_event_echoes_raw_body_byte_for_byte() {
    let bus = Arc::new(InMemoryEventBus::new());
    // keys out of order and a number beyond f64 precision
    let raw = r#"{"messageHistory":[],"authorization":"a","n":12345678901234567890123}"#;

    let outcome = handler_with(Arc::new(MockChatProvider::new()), bus.clone())
        .handle_raw(raw)
        .await
        .unwrap();

    let event = expect_rejected(outcome);
    assert_eq!(event.error_type, ErrorKind::RequestBodyValidation);
    assert_eq!(event.message_body, raw);
    assert_eq!(bus.published_events()[0].detail["messageBody"], raw);
}

#[tokio::test]
async fn openai_prompt_over_budget_fails_before_sending() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = OpenAIProvider::new(
        OpenAIConfig::new(SecretString::new("sk-test".to_string()))
            .with_base_url(UNREACHABLE_BASE_URL),
    );
    let mut body = minimal_body();
    body["messageHistory"] = json!([{"role": "user", "text": "x".repeat(80_000)}]);

    let outcome = handler_with(Arc::new(provider), bus.clone())
        .handle(body)
        .await
        .unwrap();

    let event = expect_rejected(outcome);
    assert_eq!(event.error_type, ErrorKind::ChatPromptCreation);
    assert!(event.error.starts_with("Error creating chat prompt:"));
    assert_eq!(bus.event_count(), 1);
}

#[tokio::test]
async fn gemini_with_empty_history_is_rejected() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = GeminiProvider::new(
        GeminiConfig::new(
            SecretString::new("gemini-test".to_string()),
            GeminiVariant::SystemInstruction,
        )
        .with_base_url(UNREACHABLE_BASE_URL),
    );
    let mut body = minimal_body();
    body["messageHistory"] = json!([]);

    let outcome = handler_with(Arc::new(provider), bus.clone())
        .handle(body)
        .await
        .unwrap();

    let event = expect_rejected(outcome);
    assert_eq!(event.error_type, ErrorKind::ChatPromptCreation);
}

// =============================================================================
// Retryable failures
// =============================================================================

#[tokio::test]
async fn provider_error_escapes_without_publishing() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = MockChatProvider::new().with_error(AIError::rate_limited(20));

    let err = handler_with(Arc::new(provider), bus.clone())
        .handle(minimal_body())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderInvocation);
    assert!(err.classification().retryable);
    assert_eq!(bus.event_count(), 0);
}

#[tokio::test]
async fn unreachable_provider_is_retryable() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = OpenAIProvider::new(
        OpenAIConfig::new(SecretString::new("sk-test".to_string()))
            .with_base_url(UNREACHABLE_BASE_URL),
    );

    let err = handler_with(Arc::new(provider), bus.clone())
        .handle(minimal_body())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderInvocation);
    assert_eq!(bus.event_count(), 0);
}
