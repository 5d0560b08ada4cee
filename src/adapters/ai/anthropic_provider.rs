//! Anthropic Provider - messages API adapter.
//!
//! The system instruction goes in the top-level `system` field and any
//! system-role history entries are dropped. Replies are read with the
//! tolerant extractor.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AnthropicConfig::new(api_key)
//!     .with_model("claude-3-sonnet-20240229")
//!     .with_base_url("https://api.anthropic.com");
//!
//! let provider = AnthropicProvider::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::http::post_json;
use crate::domain::conversation::{ChatPrompt, ExtractionMode, PromptError, Role};
use crate::ports::{
    complete_with, AIError, ChatCompletion, CompletionError, ProviderAdapter, ProviderInfo,
};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic provider.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key for authentication.
    api_key: SecretString,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Fixed reply budget.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnthropicConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            max_tokens: 2_000,
            temperature: 0.1,
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

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Anthropic messages adapter.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider with the given configuration.
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    type Request = AnthropicRequest;
    type Reply = AnthropicResponse;

    fn map_role(role: Role) -> &'static str {
        match role {
            Role::System => "user",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn build_request(&self, prompt: ChatPrompt) -> Result<AnthropicRequest, PromptError> {
        let messages: Vec<AnthropicMessage> = prompt
            .history
            .into_iter()
            .filter(|msg| msg.role != Role::System)
            .map(|msg| AnthropicMessage {
                role: Self::map_role(msg.role).to_string(),
                content: msg.text,
            })
            .collect();

        if messages.is_empty() {
            return Err(PromptError::NoMessageToRespondTo);
        }

        Ok(AnthropicRequest {
            model: self.config.model.clone(),
            messages,
            system: prompt.system_instruction,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }

    async fn invoke(&self, request: &AnthropicRequest) -> Result<AnthropicResponse, AIError> {
        let builder = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key())
            .header("anthropic-version", ANTHROPIC_API_VERSION);
        post_json(builder, request).await
    }

    fn normalize_reply(&self, reply: AnthropicResponse) -> Result<String, AIError> {
        let text = reply
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }
}

#[async_trait]
impl ChatCompletion for AnthropicProvider {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError> {
        complete_with(self, prompt).await
    }

    fn extraction_mode(&self) -> ExtractionMode {
        ExtractionMode::Tolerant
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("anthropic", &self.config.model)
    }
}

// ----- Anthropic API Types -----

#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    system: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}
