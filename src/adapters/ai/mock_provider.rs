//! Mock chat provider for testing.
//!
//! Lets orchestrator tests run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured replies, consumed in order
//! - Error injection for both provider and prompt failures
//! - Prompt recording for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockChatProvider::new()
//!     .with_reply(r#"{"haveIAlreadyAskedTheseQuestions": true}"#);
//!
//! let text = provider.complete(prompt).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::conversation::{ChatPrompt, ExtractionMode, PromptError};
use crate::ports::{AIError, ChatCompletion, CompletionError, ProviderInfo};

/// Reply used once the queue runs dry. Satisfies the strict schema.
pub const DEFAULT_MOCK_REPLY: &str = r#"{"haveIAlreadyAskedTheseQuestions": true}"#;

/// A configured mock outcome.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Raw reply text.
    Reply(String),
    /// Provider failure.
    Error(AIError),
    /// Failure while building the request.
    PromptError(PromptError),
}

/// Mock provider for testing.
#[derive(Debug, Clone)]
pub struct MockChatProvider {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    mode: ExtractionMode,
    calls: Arc<Mutex<Vec<ChatPrompt>>>,
}

impl Default for MockChatProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatProvider {
    /// Creates a mock that extracts strictly.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            mode: ExtractionMode::Strict,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a reply to the queue.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(MockResponse::Reply(text.into()))
    }

    /// Adds a provider error to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Adds a prompt construction error to the queue.
    pub fn with_prompt_error(self, error: PromptError) -> Self {
        self.push(MockResponse::PromptError(error))
    }

    /// Sets the extraction strategy reported to the orchestrator.
    pub fn with_extraction_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded prompts.
    pub fn get_calls(&self) -> Vec<ChatPrompt> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, response: MockResponse) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    fn next_response(&self) -> MockResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::Reply(DEFAULT_MOCK_REPLY.to_string()))
    }
}

#[async_trait]
impl ChatCompletion for MockChatProvider {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError> {
        self.calls.lock().unwrap().push(prompt);

        match self.next_response() {
            MockResponse::Reply(text) => Ok(text),
            MockResponse::Error(err) => Err(err.into()),
            MockResponse::PromptError(err) => Err(err.into()),
        }
    }

    fn extraction_mode(&self) -> ExtractionMode {
        self.mode
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
