//! Logging configuration

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::ValidationError;

/// Log filter and output format
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `flow_guide_conversation=debug`
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    #[default]
    Json,
}

impl LoggingConfig {
    /// Builds the subscriber filter.
    pub fn env_filter(&self) -> Result<EnvFilter, ValidationError> {
        EnvFilter::try_new(&self.level)
            .map_err(|_| ValidationError::InvalidLogLevel(self.level.clone()))
    }

    /// Validate logging configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.env_filter().map(|_| ())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
