//! Credential lookup configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::ports::CredentialNames;

/// Where provider API keys are read from
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub backend: SecretBackend,

    /// Directory holding one file per secret (file backend only)
    pub directory: Option<PathBuf>,

    pub openai_api_key_secret_name: String,
    pub gemini_api_key_secret_name: String,
    pub anthropic_api_key_secret_name: String,
}

/// Secret store implementation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackend {
    /// Secret name is an environment variable
    #[default]
    Env,
    /// Secret name is a file in `directory`
    File,
}

impl SecretsConfig {
    /// Names of the three provider credentials
    pub fn credential_names(&self) -> CredentialNames {
        CredentialNames {
            openai: self.openai_api_key_secret_name.clone(),
            gemini: self.gemini_api_key_secret_name.clone(),
            anthropic: self.anthropic_api_key_secret_name.clone(),
        }
    }

    /// Validate secrets configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let names = [
            ("OPENAI_API_KEY_SECRET_NAME", &self.openai_api_key_secret_name),
            ("GEMINI_API_KEY_SECRET_NAME", &self.gemini_api_key_secret_name),
            ("ANTHROPIC_API_KEY_SECRET_NAME", &self.anthropic_api_key_secret_name),
        ];
        for (name, value) in names {
            if value.trim().is_empty() {
                return Err(ValidationError::BlankValue(name));
            }
        }

        if self.backend == SecretBackend::File && self.directory.is_none() {
            return Err(ValidationError::MissingRequired("SECRETS__DIRECTORY"));
        }

        Ok(())
    }
}
