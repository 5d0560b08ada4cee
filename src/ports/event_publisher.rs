//! EventPublisher port - Interface for publishing turn outcomes.
//!
//! The orchestrator publishes one event per turn without knowing about the
//! underlying transport (an event bus endpoint, stdout, in-memory).

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

/// Transport wrapper for an outbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusEvent {
    /// Unique ID for deduplication downstream.
    pub event_id: Uuid,
    /// Event source, e.g. "flow-guide.conversation".
    pub source: String,
    /// Detail type used for routing.
    pub detail_type: String,
    /// Event payload.
    pub detail: JsonValue,
}

impl BusEvent {
    /// Wraps a serializable payload.
    ///
    /// # Errors
    ///
    /// - `PublishError::Serialization` if the payload cannot be serialized
    pub fn new<T: Serialize>(
        source: impl Into<String>,
        detail_type: impl Into<String>,
        detail: &T,
    ) -> Result<Self, PublishError> {
        let detail = serde_json::to_value(detail)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        Ok(Self {
            event_id: Uuid::new_v4(),
            source: source.into(),
            detail_type: detail_type.into(),
            detail,
        })
    }
}

/// Errors that can occur while publishing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("failed to serialize event: {0}")]
    Serialization(String),

    #[error("event bus unreachable: {0}")]
    Transport(String),

    #[error("event bus rejected the event: {0}")]
    Rejected(String),
}

/// Port for publishing outbound events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (consumers may receive duplicates)
/// - Errors are propagated to the caller
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: BusEvent) -> Result<(), PublishError>;
}
