//! In-memory event bus implementation for testing.
//!
//! Captures every published event for assertions.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::ports::{BusEvent, EventPublisher, PublishError};

/// In-memory event bus for testing.
///
/// # Example
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
///
/// handler.handle_raw(body).await?;
///
/// assert_eq!(bus.event_count(), 1);
/// assert!(bus.has_event("botResponseMessage"));
/// ```
pub struct InMemoryEventBus {
    published: RwLock<Vec<BusEvent>>,
    failure: RwLock<Option<PublishError>>,
}

impl InMemoryEventBus {
    /// Creates a new empty event bus.
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    /// Makes every subsequent publish fail with `error`.
    pub fn fail_with(&self, error: PublishError) {
        *self
            .failure
            .write()
            .expect("InMemoryEventBus: failure write lock poisoned") = Some(error);
    }

    // === Test Helpers ===

    /// Returns all published events (for test assertions).
    pub fn published_events(&self) -> Vec<BusEvent> {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .clone()
    }

    /// Returns events with a specific detail type.
    pub fn events_of_type(&self, detail_type: &str) -> Vec<BusEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| e.detail_type == detail_type)
            .collect()
    }

    /// Clears all published events (for test isolation).
    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .clear();
    }

    /// Returns count of published events.
    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .len()
    }

    /// Checks if an event with the detail type was published.
    pub fn has_event(&self, detail_type: &str) -> bool {
        self.published
            .read()
            .expect("InMemoryEventBus: published lock poisoned")
            .iter()
            .any(|e| e.detail_type == detail_type)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BusEvent) -> Result<(), PublishError> {
        let failure = self
            .failure
            .read()
            .expect("InMemoryEventBus: failure lock poisoned")
            .clone();
        if let Some(error) = failure {
            return Err(error);
        }

        self.published
            .write()
            .expect("InMemoryEventBus: published write lock poisoned")
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(detail_type: &str) -> BusEvent {
        BusEvent::new("test.source", detail_type, &json!({"ok": true})).unwrap()
    }

    #[tokio::test]
    async fn publish_stores_event() {
        let bus = InMemoryEventBus::new();

        bus.publish(event("botResponseMessage")).await.unwrap();

        assert_eq!(bus.event_count(), 1);
        assert!(bus.has_event("botResponseMessage"));
        assert!(!bus.has_event("other"));
    }

    #[tokio::test]
    async fn events_of_type_filters() {
        let bus = InMemoryEventBus::new();
        bus.publish(event("a")).await.unwrap();
        bus.publish(event("b")).await.unwrap();
        bus.publish(event("a")).await.unwrap();

        assert_eq!(bus.events_of_type("a").len(), 2);
        assert_eq!(bus.events_of_type("b").len(), 1);
    }

    #[tokio::test]
    async fn clear_removes_all_events() {
        let bus = InMemoryEventBus::new();
        bus.publish(event("a")).await.unwrap();

        bus.clear();

        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn injected_failure_is_returned() {
        let bus = InMemoryEventBus::new();
        bus.fail_with(PublishError::Transport("down".to_string()));

        let result = bus.publish(event("a")).await;

        assert_eq!(result, Err(PublishError::Transport("down".to_string())));
        assert_eq!(bus.event_count(), 0);
    }
}
