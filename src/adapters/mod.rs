//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the turn logic to external systems:
//! - `ai` - LLM providers (OpenAI, Anthropic, Gemini, mock)
//! - `events` - Event publishers (HTTP bus, stdout, in-memory)
//! - `secrets` - Credential stores (environment, files, in-memory)

pub mod ai;
pub mod events;
pub mod secrets;

pub use ai::{build_provider, MockChatProvider};
pub use events::{build_publisher, InMemoryEventBus};
pub use secrets::{build_secret_store, InMemorySecretStore};
