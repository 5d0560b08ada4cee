//! SecretStore port - Interface for credential retrieval.
//!
//! Provider API keys are fetched once at startup. The three lookups are
//! independent and run concurrently.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur while retrieving a secret.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("Could not retrieve secret {0}")]
    NotFound(String),

    #[error("Secret {0} is empty")]
    Empty(String),

    #[error("Failed to read secret {name}: {reason}")]
    Unreadable { name: String, reason: String },
}

/// Port for reading named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Returns the secret stored under `name`.
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError>;
}

/// Names of the three provider credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialNames {
    pub openai: String,
    pub gemini: String,
    pub anthropic: String,
}

/// API keys for every supported provider.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub openai_api_key: SecretString,
    pub gemini_api_key: SecretString,
    pub anthropic_api_key: SecretString,
}

impl ProviderCredentials {
    /// Fetches all three credentials concurrently.
    ///
    /// # Errors
    ///
    /// Fails with the first lookup error; an empty secret counts as an error.
    pub async fn fetch(
        store: &dyn SecretStore,
        names: &CredentialNames,
    ) -> Result<Self, SecretError> {
        let (openai_api_key, gemini_api_key, anthropic_api_key) = futures::try_join!(
            fetch_non_empty(store, &names.openai),
            fetch_non_empty(store, &names.gemini),
            fetch_non_empty(store, &names.anthropic),
        )?;

        Ok(Self {
            openai_api_key,
            gemini_api_key,
            anthropic_api_key,
        })
    }
}

async fn fetch_non_empty(store: &dyn SecretStore, name: &str) -> Result<SecretString, SecretError> {
    let secret = store.get_secret(name).await?;
    if secret.expose_secret().trim().is_empty() {
        return Err(SecretError::Empty(name.to_string()));
    }
    Ok(secret)
}
