//! AI provider configuration

use serde::Deserialize;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AiConfig {
    /// Provider that answers every turn
    #[serde(default)]
    pub provider: ProviderKind,

    pub openai_model: Option<String>,
    pub openai_base_url: Option<String>,

    pub anthropic_model: Option<String>,
    pub anthropic_base_url: Option<String>,

    /// Applies to both Gemini variants
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
}

/// Which provider adapter to build
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    #[default]
    Anthropic,
    Gemini15,
    Gemini10,
}

impl AiConfig {
    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let models = [
            ("AI__OPENAI_MODEL", &self.openai_model),
            ("AI__ANTHROPIC_MODEL", &self.anthropic_model),
            ("AI__GEMINI_MODEL", &self.gemini_model),
        ];
        for (name, model) in models {
            if model.as_ref().is_some_and(|m| m.trim().is_empty()) {
                return Err(ValidationError::BlankValue(name));
            }
        }

        let urls = [
            ("AI__OPENAI_BASE_URL", &self.openai_base_url),
            ("AI__ANTHROPIC_BASE_URL", &self.anthropic_base_url),
            ("AI__GEMINI_BASE_URL", &self.gemini_base_url),
        ];
        for (name, url) in urls {
            if url.as_deref().is_some_and(|u| !is_http_url(u)) {
                return Err(ValidationError::InvalidUrl(name));
            }
        }

        Ok(())
    }
}

pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
