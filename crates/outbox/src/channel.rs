use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{EventEnvelope, EventSink, OutboxError, Result};

/// Event sink that hands envelopes to a background consumer.
///
/// Publishing never waits: when the channel is full the envelope is
/// rejected with [`OutboxError::ChannelFull`] so the producing operation is
/// not slowed down by a lagging consumer.
#[derive(Clone)]
pub struct ChannelEventSink {
    sender: mpsc::Sender<EventEnvelope>,
}

impl ChannelEventSink {
    /// Creates a sink and the receiver its consumer should drain.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Wraps an existing sender.
    pub fn from_sender(sender: mpsc::Sender<EventEnvelope>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn publish(&self, envelope: EventEnvelope) -> Result<()> {
        self.sender.try_send(envelope).map_err(|e| match e {
            TrySendError::Full(envelope) => OutboxError::ChannelFull {
                event_type: envelope.event_type,
            },
            TrySendError::Closed(_) => OutboxError::ChannelClosed,
        })
    }
}

#[cfg(test)]
mod tests {
    use common::CartId;

    use super::*;

    fn envelope() -> EventEnvelope {
        EventEnvelope::builder()
            .event_type("CartCleared")
            .aggregate_id(CartId::new())
            .aggregate_type("Cart")
            .payload_raw(serde_json::json!({"reason": "order_created"}))
            .build()
    }

    #[tokio::test]
    async fn test_delivers_to_receiver() {
        let (sink, mut receiver) = ChannelEventSink::new(4);
        sink.publish(envelope()).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event_type, "CartCleared");
    }

    #[tokio::test]
    async fn test_full_channel_rejects_without_blocking() {
        let (sink, _receiver) = ChannelEventSink::new(1);
        sink.publish(envelope()).await.unwrap();

        let result = sink.publish(envelope()).await;
        assert!(matches!(result, Err(OutboxError::ChannelFull { .. })));
    }

    #[tokio::test]
    async fn test_zero_capacity_holds_one_envelope() {
        let (sink, mut receiver) = ChannelEventSink::new(0);
        sink.publish(envelope()).await.unwrap();
        assert!(matches!(
            sink.publish(envelope()).await,
            Err(OutboxError::ChannelFull { .. })
        ));
        assert_eq!(receiver.recv().await.unwrap().event_type, "CartCleared");
    }

    #[tokio::test]
    async fn test_closed_channel_is_reported() {
        let (sink, receiver) = ChannelEventSink::new(1);
        drop(receiver);

        let result = sink.publish(envelope()).await;
        assert!(matches!(result, Err(OutboxError::ChannelClosed)));
    }
}
