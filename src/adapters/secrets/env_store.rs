//! Environment-variable secret store.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::ports::{SecretError, SecretStore};

/// Reads each secret from the environment variable of the same name.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        std::env::var(name)
            .map(SecretString::new)
            .map_err(|_| SecretError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn reads_variable_by_name() {
        std::env::set_var("FLOW_GUIDE_TEST_ENV_SECRET", "sk-123");

        let secret = EnvSecretStore::new()
            .get_secret("FLOW_GUIDE_TEST_ENV_SECRET")
            .await
            .unwrap();

        assert_eq!(secret.expose_secret(), "sk-123");
        std::env::remove_var("FLOW_GUIDE_TEST_ENV_SECRET");
    }

    #[tokio::test]
    async fn missing_variable_is_not_found() {
        let result = EnvSecretStore::new()
            .get_secret("FLOW_GUIDE_TEST_SECRET_THAT_IS_NOT_SET")
            .await;

        assert_eq!(
            result.unwrap_err(),
            SecretError::NotFound("FLOW_GUIDE_TEST_SECRET_THAT_IS_NOT_SET".to_string())
        );
    }
}
