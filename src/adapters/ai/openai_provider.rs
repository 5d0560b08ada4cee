//! OpenAI Provider - chat completions adapter.
//!
//! The system instruction travels as the leading `system` message. The output
//! budget shrinks as the prompt grows:
//!
//! ```text
//! max_tokens = min(max_output_tokens, context_window - estimated_prompt_tokens)
//! ```
//!
//! A budget of zero or less fails before any request is sent.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-3.5-turbo-0125")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::http::post_json;
use crate::domain::conversation::{
    estimate_tokens, ChatPrompt, ExtractionMode, PromptError, Role,
};
use crate::ports::{
    complete_with, AIError, ChatCompletion, CompletionError, ProviderAdapter, ProviderInfo,
};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo-0125";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-message framing overhead added to the token estimate.
const TOKENS_PER_MESSAGE: u32 = 4;

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: SecretString,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Total tokens the model accepts, prompt plus reply.
    pub context_window: u32,
    /// Upper bound on reply tokens.
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            context_window: 16_000,
            max_output_tokens: 4_000,
            temperature: 0.01,
            frequency_penalty: 0.6,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the context window and reply ceiling.
    pub fn with_token_limits(mut self, context_window: u32, max_output_tokens: u32) -> Self {
        self.context_window = context_window;
        self.max_output_tokens = max_output_tokens;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI chat completions adapter.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new OpenAI provider with the given configuration.
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Reply budget for a set of wire messages.
    fn output_budget(&self, messages: &[OpenAIMessage]) -> Result<u32, PromptError> {
        let prompt_tokens: u32 = messages
            .iter()
            .map(|m| estimate_tokens(&m.content) + TOKENS_PER_MESSAGE)
            .sum();

        let remaining = i64::from(self.config.context_window) - i64::from(prompt_tokens);
        let budget = remaining.min(i64::from(self.config.max_output_tokens));

        if budget <= 0 {
            return Err(PromptError::TokenLimit {
                prompt_tokens,
                context_window: self.config.context_window,
            });
        }
        Ok(budget as u32)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIProvider {
    type Request = OpenAIRequest;
    type Reply = OpenAIResponse;

    fn map_role(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_request(&self, prompt: ChatPrompt) -> Result<OpenAIRequest, PromptError> {
        let mut messages = Vec::with_capacity(prompt.history.len() + 1);
        messages.push(OpenAIMessage {
            role: Self::map_role(Role::System).to_string(),
            content: prompt.system_instruction,
        });
        messages.extend(prompt.history.into_iter().map(|msg| OpenAIMessage {
            role: Self::map_role(msg.role).to_string(),
            content: msg.text,
        }));

        let max_tokens = self.output_budget(&messages)?;

        Ok(OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens,
            temperature: self.config.temperature,
            frequency_penalty: self.config.frequency_penalty,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        })
    }

    async fn invoke(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, AIError> {
        let builder = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()));
        post_json(builder, request).await
    }

    fn normalize_reply(&self, reply: OpenAIResponse) -> Result<String, AIError> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        if choice.finish_reason.as_deref() == Some("content_filter") {
            return Err(AIError::content_filtered("content_filter"));
        }

        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl ChatCompletion for OpenAIProvider {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError> {
        complete_with(self, prompt).await
    }

    fn extraction_mode(&self) -> ExtractionMode {
        ExtractionMode::Strict
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
    frequency_penalty: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIReplyMessage {
    content: Option<String>,
}
