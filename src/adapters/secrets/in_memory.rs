//! In-memory secret store for testing.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;

use crate::ports::{SecretError, SecretStore};

/// Secret store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct InMemorySecretStore {
    secrets: HashMap<String, String>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        self.secrets
            .get(name)
            .map(|value| SecretString::new(value.clone()))
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}
