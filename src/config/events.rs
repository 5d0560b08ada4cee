//! Outbound event configuration

use serde::Deserialize;

use super::ai::is_http_url;
use super::error::ValidationError;

/// Event source and routing
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Source stamped on every published event
    pub source: String,

    /// Detail type stamped on every published event
    pub detail_type: String,

    /// Event bus endpoint; events go to stdout when absent
    pub endpoint: Option<String>,
}

impl EventsConfig {
    /// Validate event configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.source.trim().is_empty() {
            return Err(ValidationError::BlankValue("EVENTS__SOURCE"));
        }
        if self.detail_type.trim().is_empty() {
            return Err(ValidationError::BlankValue("EVENTS__DETAIL_TYPE"));
        }
        if self.endpoint.as_deref().is_some_and(|e| !is_http_url(e)) {
            return Err(ValidationError::InvalidUrl("EVENTS__ENDPOINT"));
        }
        Ok(())
    }
}
