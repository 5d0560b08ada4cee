//! Secret store adapters.
//!
//! - `EnvSecretStore` - Environment variables
//! - `FileSecretStore` - One file per secret in a directory
//! - `InMemorySecretStore` - Map-backed store for testing

mod env_store;
mod file_store;
mod in_memory;

pub use env_store::EnvSecretStore;
pub use file_store::FileSecretStore;
pub use in_memory::InMemorySecretStore;

use crate::config::{SecretBackend, SecretsConfig};
use crate::ports::SecretStore;

/// Builds the configured secret store.
pub fn build_secret_store(config: &SecretsConfig) -> Box<dyn SecretStore> {
    match (config.backend, &config.directory) {
        (SecretBackend::File, Some(directory)) => Box::new(FileSecretStore::new(directory.clone())),
        _ => Box::new(EnvSecretStore::new()),
    }
}
