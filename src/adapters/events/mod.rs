//! Event publisher adapters.
//!
//! - `HttpEventPublisher` - Posts to an event bus endpoint
//! - `StdoutEventPublisher` - JSON lines on stdout
//! - `InMemoryEventBus` - Captures events for testing

mod http_publisher;
mod in_memory;
mod stdout_publisher;

pub use http_publisher::HttpEventPublisher;
pub use in_memory::InMemoryEventBus;
pub use stdout_publisher::StdoutEventPublisher;

use std::sync::Arc;

use crate::config::EventsConfig;
use crate::ports::EventPublisher;

/// Builds the publisher for the configured endpoint, stdout when none is set.
pub fn build_publisher(config: &EventsConfig) -> Arc<dyn EventPublisher> {
    match &config.endpoint {
        Some(endpoint) => Arc::new(HttpEventPublisher::new(endpoint.clone())),
        None => Arc::new(StdoutEventPublisher::new()),
    }
}
