use async_trait::async_trait;

use crate::{EventEnvelope, Result};

/// Destination for domain events.
///
/// Publication happens after the state change it describes has been
/// persisted. Callers treat failures as non-fatal: they log and move on.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes a single envelope.
    async fn publish(&self, envelope: EventEnvelope) -> Result<()>;
}

/// Convenience methods for event sinks.
#[async_trait]
pub trait EventSinkExt: EventSink {
    /// Publishes envelopes in order, continuing past failures.
    ///
    /// Returns the number of envelopes that could not be published.
    async fn publish_all(&self, envelopes: Vec<EventEnvelope>) -> usize {
        let mut failed = 0;
        for envelope in envelopes {
            let event_type = envelope.event_type.clone();
            if let Err(e) = self.publish(envelope).await {
                tracing::warn!(%event_type, error = %e, "event publication failed");
                failed += 1;
            }
        }
        failed
    }
}

impl<T: EventSink + ?Sized> EventSinkExt for T {}
