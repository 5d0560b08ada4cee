//! HTTP event publisher.
//!
//! Posts each event to an event bus endpoint as a single-entry batch:
//!
//! ```json
//! {"Entries": [{"Source": "...", "DetailType": "...", "Detail": "<json string>"}]}
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::ports::{BusEvent, EventPublisher, PublishError};

/// Publishes events over HTTP.
pub struct HttpEventPublisher {
    endpoint: String,
    client: Client,
}

impl HttpEventPublisher {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutEventsRequest {
    entries: Vec<PutEventsEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutEventsEntry {
    source: String,
    detail_type: String,
    /// Serialized JSON, as the bus expects a string.
    detail: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutEventsResponse {
    #[serde(default)]
    failed_entry_count: u32,
}

impl PutEventsRequest {
    fn from_event(event: &BusEvent) -> Result<Self, PublishError> {
        let detail = serde_json::to_string(&event.detail)
            .map_err(|e| PublishError::Serialization(e.to_string()))?;

        Ok(Self {
            entries: vec![PutEventsEntry {
                source: event.source.clone(),
                detail_type: event.detail_type.clone(),
                detail,
            }],
        })
    }
}

#[async_trait]
impl EventPublisher for HttpEventPublisher {
    async fn publish(&self, event: BusEvent) -> Result<(), PublishError> {
        let body = PutEventsRequest::from_event(&event)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(format!("{}: {}", status, text)));
        }

        // Empty or non-JSON success bodies count as accepted.
        let reply: PutEventsResponse = response.json().await.unwrap_or_default();
        if reply.failed_entry_count > 0 {
            return Err(PublishError::Rejected(format!(
                "{} entries failed",
                reply.failed_entry_count
            )));
        }

        tracing::debug!(event_id = %event.event_id, "Event published");
        Ok(())
    }
}
