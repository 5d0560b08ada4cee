//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the turn logic and the outside world. Adapters implement these ports.
//!
//! - `ChatCompletion` / `ProviderAdapter` - LLM providers
//! - `EventPublisher` - Outbound turn events
//! - `SecretStore` - Provider credentials

mod ai_provider;
mod event_publisher;
mod secret_store;

pub use ai_provider::{
    complete_with, AIError, ChatCompletion, CompletionError, ProviderAdapter, ProviderInfo,
};
pub use event_publisher::{BusEvent, EventPublisher, PublishError};
pub use secret_store::{CredentialNames, ProviderCredentials, SecretError, SecretStore};
