//! Directory-backed secret store.
//!
//! Each secret is a file named after it, as mounted secret volumes lay them
//! out. Surrounding whitespace is trimmed.

use async_trait::async_trait;
use secrecy::SecretString;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::ports::{SecretError, SecretStore};

/// Reads secrets from files in a directory.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    directory: PathBuf,
}

impl FileSecretStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<SecretString, SecretError> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(SecretError::Unreadable {
                name: name.to_string(),
                reason: "secret names must be plain file names".to_string(),
            });
        }

        let path = self.directory.join(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(SecretString::new(contents.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SecretError::NotFound(name.to_string()))
            }
            Err(e) => Err(SecretError::Unreadable {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    #[tokio::test]
    async fn reads_and_trims_file_contents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("openai-key"), "sk-abc\n").unwrap();

        let secret = FileSecretStore::new(dir.path())
            .get_secret("openai-key")
            .await
            .unwrap();

        assert_eq!(secret.expose_secret(), "sk-abc");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();

        let result = FileSecretStore::new(dir.path()).get_secret("absent").await;

        assert_eq!(result.unwrap_err(), SecretError::NotFound("absent".to_string()));
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();

        let result = FileSecretStore::new(dir.path())
            .get_secret("../etc/passwd")
            .await;

        assert!(matches!(result, Err(SecretError::Unreadable { .. })));
    }
}
