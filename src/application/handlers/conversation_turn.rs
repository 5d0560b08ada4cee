//! ConversationTurn handler.
//!
//! Runs one turn end to end: validate the inbound body, compose the system
//! prompt, call the configured provider, extract the reply, and publish the
//! outcome. Terminal failures are published as error events and swallowed;
//! everything else is returned so the invoking runtime redelivers the turn.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::domain::conversation::{
    BotErrorEvent, BotResponseEvent, ExtractionError, ExtractionMode, PromptComposer,
    PromptError, TurnRequest,
};
use crate::domain::foundation::{
    classify, ErrorClassification, ErrorKind, Timestamp, ValidationError,
};
use crate::ports::{
    AIError, BusEvent, ChatCompletion, CompletionError, EventPublisher, PublishError,
    SecretError,
};

/// Errors that can end a turn.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Error parsing body JSON: {0}")]
    BodyJsonParse(String),

    #[error("Request body validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("Error from AI provider: {0}")]
    Provider(#[from] AIError),

    #[error("Error extracting reply: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Error publishing event: {0}")]
    Publish(#[from] PublishError),

    #[error("Error retrieving secrets: {0}")]
    Secret(#[from] SecretError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<CompletionError> for TurnError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Prompt(e) => TurnError::Prompt(e),
            CompletionError::Provider(e) => TurnError::Provider(e),
        }
    }
}

impl TurnError {
    /// Failure kind published as `errorType`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TurnError::BodyJsonParse(_) => ErrorKind::BodyJsonParse,
            TurnError::Validation(_) => ErrorKind::RequestBodyValidation,
            TurnError::Prompt(_) => ErrorKind::ChatPromptCreation,
            TurnError::Provider(_) => ErrorKind::ProviderInvocation,
            TurnError::Extraction(_) => ErrorKind::ResponseSchema,
            TurnError::Publish(_) => ErrorKind::EventPublication,
            TurnError::Secret(_) => ErrorKind::SecretRetrieval,
            TurnError::Config(_) => ErrorKind::EnvironmentVariable,
        }
    }

    pub fn classification(&self) -> ErrorClassification {
        classify(self.kind())
    }
}

/// How a turn ended without error.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The assistant's reply was published.
    Responded(BotResponseEvent),
    /// A terminal error was published instead.
    Rejected(BotErrorEvent),
}

/// Event source and detail type stamped on published events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRouting {
    pub source: String,
    pub detail_type: String,
}

impl EventRouting {
    pub fn new(source: impl Into<String>, detail_type: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            detail_type: detail_type.into(),
        }
    }
}

/// Handler for conversation turns.
pub struct ConversationTurnHandler {
    provider: Arc<dyn ChatCompletion>,
    publisher: Arc<dyn EventPublisher>,
    composer: PromptComposer,
    routing: EventRouting,
    clock: fn() -> Timestamp,
}

impl ConversationTurnHandler {
    /// Creates a new handler with the given dependencies.
    pub fn new(
        provider: Arc<dyn ChatCompletion>,
        publisher: Arc<dyn EventPublisher>,
        routing: EventRouting,
    ) -> Self {
        Self {
            provider,
            publisher,
            composer: PromptComposer::default(),
            routing,
            clock: Timestamp::now,
        }
    }

    /// Replaces the time source used in the system prompt.
    pub fn with_clock(mut self, clock: fn() -> Timestamp) -> Self {
        self.clock = clock;
        self
    }

    /// Handles an inbound body given as text.
    ///
    /// # Errors
    ///
    /// Returns only retryable errors; terminal ones are published and reported
    /// as [`TurnOutcome::Rejected`].
    pub async fn handle_raw(&self, raw: &str) -> Result<TurnOutcome, TurnError> {
        let span = tracing::info_span!(
            "turn",
            turn_id = %Uuid::new_v4(),
            conversation_id = tracing::field::Empty
        );

        async move {
            match serde_json::from_str::<JsonValue>(raw) {
                Ok(body) => self.handle_body(body, raw).await,
                Err(e) => {
                    self.finish(Err(TurnError::BodyJsonParse(e.to_string())), raw)
                        .await
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handles an inbound body that is already JSON.
    ///
    /// # Errors
    ///
    /// See [`handle_raw`](Self::handle_raw).
    pub async fn handle(&self, body: JsonValue) -> Result<TurnOutcome, TurnError> {
        let span = tracing::info_span!(
            "turn",
            turn_id = %Uuid::new_v4(),
            conversation_id = tracing::field::Empty
        );

        let message_body = body.to_string();
        self.handle_body(body, &message_body)
            .instrument(span)
            .await
    }

    /// `message_body` is echoed verbatim in any error event.
    async fn handle_body(
        &self,
        body: JsonValue,
        message_body: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let result = self.run(body).await;
        self.finish(result, message_body).await
    }

    async fn run(&self, body: JsonValue) -> Result<BotResponseEvent, TurnError> {
        let request = TurnRequest::from_json(body)?;
        tracing::Span::current().record("conversation_id", request.conversation_id.as_str());
        tracing::debug!(
            messages = request.message_history.len(),
            contexts = request.extra_context.len(),
            actions = request.possible_response_actions.len(),
            "Validated turn request"
        );

        let tools = self.composer.compose(
            &request.extra_context,
            &request.possible_response_actions,
            (self.clock)(),
        )?;
        let prompt = tools.chat_prompt(request.message_history.clone());

        let info = self.provider.provider_info();
        tracing::info!(provider = %info.name, model = %info.model, "Requesting completion");
        let reply = self.provider.complete(prompt).await?;
        tracing::debug!(reply_len = reply.len(), "Completion received");

        let turn = match self.provider.extraction_mode() {
            ExtractionMode::Strict => tools.strict().extract(&reply)?,
            ExtractionMode::Tolerant => tools.tolerant().extract(&reply),
        };

        let event = BotResponseEvent::from_turn(&request, &turn);
        self.publish(&event).await?;
        tracing::info!(
            response_actions = event.response_actions.len(),
            "Turn completed"
        );
        Ok(event)
    }

    async fn finish(
        &self,
        result: Result<BotResponseEvent, TurnError>,
        message_body: &str,
    ) -> Result<TurnOutcome, TurnError> {
        let err = match result {
            Ok(event) => return Ok(TurnOutcome::Responded(event)),
            Err(err) => err,
        };

        let classification = err.classification();
        if classification.retryable {
            tracing::error!(error = %err, kind = %classification.kind, "Turn failed; leaving for redelivery");
            return Err(err);
        }

        tracing::warn!(error = %err, kind = %classification.kind, "Turn rejected");
        let event = BotErrorEvent::new(err.to_string(), classification.kind, message_body);
        self.publish(&event).await?;
        Ok(TurnOutcome::Rejected(event))
    }

    async fn publish<T: serde::Serialize>(&self, detail: &T) -> Result<(), PublishError> {
        let event = BusEvent::new(&self.routing.source, &self.routing.detail_type, detail)?;
        self.publisher.publish(event).await
    }
}
