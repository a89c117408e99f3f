use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AggregateId, EventId, OutboxError, Result};

/// A domain event ready for publication.
///
/// The payload is the serialized event. Everything else is routing
/// information a consumer can filter on without decoding the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Routing name, e.g. "OrderCreated" or "StockLow".
    pub event_type: String,

    /// The entity this event is about.
    pub aggregate_id: AggregateId,

    /// Kind of that entity: "Order", "Cart" or "Product".
    pub aggregate_type: String,

    pub occurred_at: DateTime<Utc>,

    pub payload: serde_json::Value,

    /// Free-form metadata such as correlation ids.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelope {
    pub fn builder() -> EventEnvelopeBuilder {
        EventEnvelopeBuilder::default()
    }

    /// Decodes the payload into a typed event.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }
}

/// Assembles an [`EventEnvelope`] field by field.
///
/// The event id defaults to a fresh one and `occurred_at` to now. The other
/// routing fields and the payload are required.
#[derive(Debug, Default)]
pub struct EventEnvelopeBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    occurred_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventEnvelopeBuilder {
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: impl Into<AggregateId>) -> Self {
        self.aggregate_id = Some(id.into());
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn occurred_at(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(at);
        self
    }

    /// Serializes `payload` into the envelope.
    pub fn payload<T: Serialize>(
        mut self,
        payload: &T,
    ) -> std::result::Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the envelope.
    ///
    /// # Panics
    ///
    /// Panics if a required field is missing. Use [`try_build`](Self::try_build)
    /// when the fields come from untrusted input.
    pub fn build(self) -> EventEnvelope {
        match self.try_build() {
            Ok(envelope) => envelope,
            Err(e) => panic!("{e}"),
        }
    }

    /// Builds the envelope, naming the first missing field on failure.
    pub fn try_build(self) -> Result<EventEnvelope> {
        let missing = OutboxError::MissingField;
        Ok(EventEnvelope {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self.event_type.ok_or(missing("event_type"))?,
            aggregate_id: self.aggregate_id.ok_or(missing("aggregate_id"))?,
            aggregate_type: self.aggregate_type.ok_or(missing("aggregate_type"))?,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            payload: self.payload.ok_or(missing("payload"))?,
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use common::OrderId;

    use super::*;

    #[test]
    fn test_builder_sets_routing_fields() {
        let order_id = OrderId::new();
        let payload = serde_json::json!({"order_number": "ORD-20240101-deadbeef"});

        let envelope = EventEnvelope::builder()
            .event_type("OrderCreated")
            .aggregate_id(order_id)
            .aggregate_type("Order")
            .payload_raw(payload.clone())
            .metadata("correlation_id", serde_json::json!("abc"))
            .build();

        assert_eq!(envelope.event_type, "OrderCreated");
        assert_eq!(envelope.aggregate_id.as_uuid(), order_id.as_uuid());
        assert_eq!(envelope.aggregate_type, "Order");
        assert_eq!(envelope.payload, payload);
        assert_eq!(
            envelope.metadata.get("correlation_id"),
            Some(&serde_json::json!("abc"))
        );
    }

    #[test]
    fn test_payload_round_trips_through_decode() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Cleared {
            reason: String,
        }

        let envelope = EventEnvelope::builder()
            .event_type("CartCleared")
            .aggregate_id(AggregateId::new())
            .aggregate_type("Cart")
            .payload(&Cleared {
                reason: "order_created".to_string(),
            })
            .unwrap()
            .build();

        assert_eq!(envelope.payload["reason"], "order_created");
        let decoded: Cleared = envelope.decode().unwrap();
        assert_eq!(decoded.reason, "order_created");
    }

    #[test]
    fn test_try_build_names_missing_field() {
        let result = EventEnvelope::builder()
            .event_type("OrderCreated")
            .aggregate_id(AggregateId::new())
            .aggregate_type("Order")
            .try_build();
        assert!(matches!(result, Err(OutboxError::MissingField("payload"))));
    }

    #[test]
    #[should_panic(expected = "missing aggregate_id")]
    fn test_build_panics_without_aggregate() {
        EventEnvelope::builder()
            .event_type("OrderCreated")
            .aggregate_type("Order")
            .payload_raw(serde_json::json!({}))
            .build();
    }
}
