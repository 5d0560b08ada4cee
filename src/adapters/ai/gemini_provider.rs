//! Gemini Provider - generateContent adapter.
//!
//! Two model generations are supported and differ only in where the system
//! instruction goes:
//!
//! - [`GeminiVariant::SystemInstruction`] (1.5) sends it as a leading
//!   `systemInstruction` object.
//! - [`GeminiVariant::PrependToFirstMessage`] (1.0) has no system field, so the
//!   instruction is glued onto the first history entry.
//!
//! In both cases the last history entry becomes the current user turn and
//! everything before it is prior context.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::http::post_json;
use crate::domain::conversation::{ChatPrompt, ExtractionMode, PromptError, Role};
use crate::ports::{
    complete_with, AIError, ChatCompletion, CompletionError, ProviderAdapter, ProviderInfo,
};

pub const DEFAULT_GEMINI_15_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_GEMINI_10_MODEL: &str = "gemini-1.0-pro";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Where the system instruction is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiVariant {
    /// Gemini 1.5: dedicated `systemInstruction` field.
    SystemInstruction,
    /// Gemini 1.0: prefixed onto the first message.
    PrependToFirstMessage,
}

impl GeminiVariant {
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::SystemInstruction => DEFAULT_GEMINI_15_MODEL,
            Self::PrependToFirstMessage => DEFAULT_GEMINI_10_MODEL,
        }
    }
}

/// Configuration for the Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    api_key: SecretString,
    pub variant: GeminiVariant,
    pub model: String,
    pub base_url: String,
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    /// Creates a configuration for the given variant with its default model.
    pub fn new(api_key: SecretString, variant: GeminiVariant) -> Self {
        Self {
            api_key,
            variant,
            model: variant.default_model().to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            max_output_tokens: 2_000,
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

/// Gemini generateContent adapter.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    type Request = GeminiRequest;
    type Reply = GeminiResponse;

    fn map_role(role: Role) -> &'static str {
        match role {
            Role::System => "user",
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    fn build_request(&self, prompt: ChatPrompt) -> Result<GeminiRequest, PromptError> {
        let ChatPrompt {
            system_instruction,
            mut history,
        } = prompt;

        let system_instruction = match self.config.variant {
            GeminiVariant::SystemInstruction => Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system_instruction,
                }],
            }),
            GeminiVariant::PrependToFirstMessage => {
                let first = history
                    .first_mut()
                    .ok_or(PromptError::NoMessageToRespondTo)?;
                first.text = format!(
                    "{}\n\nFirst message from user: {}",
                    system_instruction, first.text
                );
                None
            }
        };

        let current = history
            .pop()
            .filter(|msg| !msg.text.is_empty())
            .ok_or(PromptError::NoMessageToRespondTo)?;

        let mut contents: Vec<GeminiContent> = history
            .into_iter()
            .map(|msg| GeminiContent {
                role: Some(Self::map_role(msg.role).to_string()),
                parts: vec![GeminiPart { text: msg.text }],
            })
            .collect();
        contents.push(GeminiContent {
            role: Some(Self::map_role(Role::User).to_string()),
            parts: vec![GeminiPart { text: current.text }],
        });

        Ok(GeminiRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: self.config.max_output_tokens,
            },
        })
    }

    async fn invoke(&self, request: &GeminiRequest) -> Result<GeminiResponse, AIError> {
        let builder = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", self.config.api_key());
        post_json(builder, request).await
    }

    fn normalize_reply(&self, reply: GeminiResponse) -> Result<String, AIError> {
        if let Some(reason) = reply
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(AIError::content_filtered(reason));
        }

        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No candidates in response"))?;

        let text = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl ChatCompletion for GeminiProvider {
    async fn complete(&self, prompt: ChatPrompt) -> Result<String, CompletionError> {
        complete_with(self, prompt).await
    }

    fn extraction_mode(&self) -> ExtractionMode {
        ExtractionMode::Tolerant
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("gemini", &self.config.model)
    }
}

// ----- Gemini API Types -----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
