//! AI Provider Adapters.
//!
//! Implementations of the `ChatCompletion` port for each supported LLM.
//!
//! ## Available Adapters
//!
//! - `OpenAIProvider` - OpenAI chat completions (strict extraction)
//! - `AnthropicProvider` - Anthropic messages (tolerant extraction)
//! - `GeminiProvider` - Gemini generateContent, 1.0 and 1.5 variants
//! - `MockChatProvider` - Configurable mock for testing

mod anthropic_provider;
mod gemini_provider;
mod http;
mod mock_provider;
mod openai_provider;

pub use anthropic_provider::{
    AnthropicConfig, AnthropicProvider, DEFAULT_ANTHROPIC_BASE_URL, DEFAULT_ANTHROPIC_MODEL,
};
pub use gemini_provider::{
    GeminiConfig, GeminiProvider, GeminiVariant, DEFAULT_GEMINI_10_MODEL,
    DEFAULT_GEMINI_15_MODEL, DEFAULT_GEMINI_BASE_URL,
};
pub use mock_provider::{MockChatProvider, MockResponse, DEFAULT_MOCK_REPLY};
pub use openai_provider::{
    OpenAIConfig, OpenAIProvider, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL,
};

use std::sync::Arc;

use crate::config::{AiConfig, ProviderKind};
use crate::ports::{ChatCompletion, ProviderCredentials};

/// Builds the adapter selected by configuration.
pub fn build_provider(
    config: &AiConfig,
    credentials: &ProviderCredentials,
) -> Arc<dyn ChatCompletion> {
    match config.provider {
        ProviderKind::OpenAI => {
            let mut openai = OpenAIConfig::new(credentials.openai_api_key.clone());
            if let Some(model) = &config.openai_model {
                openai = openai.with_model(model);
            }
            if let Some(url) = &config.openai_base_url {
                openai = openai.with_base_url(url);
            }
            Arc::new(OpenAIProvider::new(openai))
        }
        ProviderKind::Anthropic => {
            let mut anthropic = AnthropicConfig::new(credentials.anthropic_api_key.clone());
            if let Some(model) = &config.anthropic_model {
                anthropic = anthropic.with_model(model);
            }
            if let Some(url) = &config.anthropic_base_url {
                anthropic = anthropic.with_base_url(url);
            }
            Arc::new(AnthropicProvider::new(anthropic))
        }
        ProviderKind::Gemini15 | ProviderKind::Gemini10 => {
            let variant = if config.provider == ProviderKind::Gemini15 {
                GeminiVariant::SystemInstruction
            } else {
                GeminiVariant::PrependToFirstMessage
            };
            let mut gemini = GeminiConfig::new(credentials.gemini_api_key.clone(), variant);
            if let Some(model) = &config.gemini_model {
                gemini = gemini.with_model(model);
            }
            if let Some(url) = &config.gemini_base_url {
                gemini = gemini.with_base_url(url);
            }
            Arc::new(GeminiProvider::new(gemini))
        }
    }
}
