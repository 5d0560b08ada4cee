//! Stdout event publisher.
//!
//! Writes each event as one JSON line. Used when no bus endpoint is
//! configured, so the invoking runtime can pick events up from the output.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::ports::{BusEvent, EventPublisher, PublishError};

/// Publishes events as JSON lines to a writer, stdout by default.
pub struct StdoutEventPublisher<W = tokio::io::Stdout> {
    writer: Mutex<W>,
}

impl StdoutEventPublisher {
    pub fn new() -> Self {
        Self::with_writer(tokio::io::stdout())
    }
}

impl Default for StdoutEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StdoutEventPublisher<W> {
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait]
impl<W> EventPublisher for StdoutEventPublisher<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&self, event: BusEvent) -> Result<(), PublishError> {
        let mut line =
            serde_json::to_vec(&event).map_err(|e| PublishError::Serialization(e.to_string()))?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|e| PublishError::Transport(e.to_string()))
    }
}
