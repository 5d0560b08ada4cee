//! AI Provider Port - Interface for LLM provider integrations.
//!
//! Two traits live here:
//!
//! - [`ProviderAdapter`] is the per-provider translation layer. Each provider
//!   decides how the generic [`ChatPrompt`] becomes its wire request (role
//!   names, where the system instruction goes, output budget), sends it, and
//!   reduces the wire reply to plain text.
//! - [`ChatCompletion`] is the object-safe face the orchestrator talks to. A
//!   provider is chosen once, from configuration, and held as
//!   `Arc<dyn ChatCompletion>`.
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl ChatCompletion for MyProvider {
//!     async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError> {
//!         complete_with(self, prompt).await
//!     }
//!     // ...
//! }
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::conversation::{ChatPrompt, ExtractionMode, PromptError, Role};

/// Translation between the generic prompt and one provider's wire protocol.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Wire request body.
    type Request: Serialize + Send + Sync;
    /// Wire reply body.
    type Reply: DeserializeOwned + Send;

    /// Provider name for a canonical role. Must be total.
    fn map_role(role: Role) -> &'static str;

    /// Builds the wire request. Runs before any network traffic.
    ///
    /// Takes ownership of the prompt; some providers consume the history.
    fn build_request(&self, prompt: ChatPrompt) -> Result<Self::Request, PromptError>;

    /// Sends the request and waits for the reply.
    async fn invoke(&self, request: &Self::Request) -> Result<Self::Reply, AIError>;

    /// Reduces the wire reply to the raw text the model produced.
    fn normalize_reply(&self, reply: Self::Reply) -> Result<String, AIError>;
}

/// Runs one adapter end to end: build, invoke, normalize.
pub async fn complete_with<P: ProviderAdapter>(
    adapter: &P,
    prompt: ChatPrompt,
) -> Result<String, CompletionError> {
    let request = adapter.build_request(prompt)?;
    let reply = adapter.invoke(&request).await?;
    Ok(adapter.normalize_reply(reply)?)
}

/// What the orchestrator needs from a provider.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Produces the model's raw reply text for a prompt.
    async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError>;

    /// Strategy this provider's replies are extracted with.
    fn extraction_mode(&self) -> ExtractionMode;

    /// Provider name and model, for logs.
    fn provider_info(&self) -> ProviderInfo;
}

/// Provider information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "openai", "anthropic").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Failure of a completion, split by whether any request was sent.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The request could not be built; nothing was sent.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// The provider call itself failed.
    #[error(transparent)]
    Provider(#[from] AIError),
}

/// AI provider errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Provider rejected the prompt as too long.
    #[error("context too long: {0}")]
    ContextTooLong(String),

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        /// Reason for filtering.
        reason: String,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Provider rejected the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AIError {
    /// Creates a rate limited error.
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Creates a content filtered error.
    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ConversationMessage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoAdapter {
        invocations: AtomicUsize,
    }

    #[async_trait]
    impl ProviderAdapter for EchoAdapter {
        type Request = Vec<String>;
        type Reply = String;

        fn map_role(role: Role) -> &'static str {
            role.as_str()
        }

        fn build_request(&self, prompt: ChatPrompt) -> Result<Self::Request, PromptError> {
            if prompt.history.is_empty() {
                return Err(PromptError::NoMessageToRespondTo);
            }
            Ok(prompt.history.into_iter().map(|m| m.text).collect())
        }

        async fn invoke(&self, request: &Self::Request) -> Result<Self::Reply, AIError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(request.join(" "))
        }

        fn normalize_reply(&self, reply: Self::Reply) -> Result<String, AIError> {
            Ok(reply.to_uppercase())
        }
    }

    #[tokio::test]
    async fn complete_with_runs_all_three_stages() {
        let adapter = EchoAdapter {
            invocations: AtomicUsize::new(0),
        };
        let prompt = ChatPrompt::new(
            "sys",
            vec![ConversationMessage::user("hi"), ConversationMessage::assistant("there")],
        );

        let text = complete_with(&adapter, prompt).await.unwrap();

        assert_eq!(text, "HI THERE");
        assert_eq!(adapter.invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn build_failure_skips_invocation() {
        let adapter = EchoAdapter {
            invocations: AtomicUsize::new(0),
        };

        let err = complete_with(&adapter, ChatPrompt::new("sys", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, CompletionError::Prompt(PromptError::NoMessageToRespondTo)));
        assert_eq!(adapter.invocations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ai_error_displays_correctly() {
        assert_eq!(
            AIError::rate_limited(30).to_string(),
            "rate limited: retry after 30s"
        );
        assert_eq!(
            AIError::unavailable("down").to_string(),
            "provider unavailable: down"
        );
    }

    #[test]
    fn completion_error_is_transparent() {
        let err: CompletionError = AIError::network("reset").into();
        assert_eq!(err.to_string(), "network error: reset");
    }
}
