//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` crate. Configuration is loaded with the
//! `FLOW_GUIDE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use flow_guide_conversation::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Answering with {:?}", config.ai.provider);
//! ```

mod ai;
mod error;
mod events;
mod logging;
mod secrets;

pub use ai::{AiConfig, ProviderKind};
pub use error::{ConfigError, ValidationError};
pub use events::EventsConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use secrets::{SecretBackend, SecretsConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Where provider API keys live
    pub secrets: SecretsConfig,

    /// Outbound event source and routing
    pub events: EventsConfig,

    /// Provider selection and overrides
    #[serde(default)]
    pub ai: AiConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Reads environment variables with `FLOW_GUIDE` prefix
    /// 2. Uses `__` (double underscore) to separate nested values
    /// 3. Deserializes into typed configuration structs
    ///
    /// A `.env` file is merged into the process environment by the binary
    /// before this runs.
    ///
    /// # Environment Variable Format
    ///
    /// - `FLOW_GUIDE__AI__PROVIDER=openai` -> `ai.provider = openai`
    /// - `FLOW_GUIDE__EVENTS__SOURCE=...` -> `events.source = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FLOW_GUIDE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.secrets.validate()?;
        self.events.validate()?;
        self.ai.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
