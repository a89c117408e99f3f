//! Domain events published after state changes are persisted.

use chrono::{DateTime, Utc};
use common::{AggregateId, CartId, OrderId, PaymentId, ProductId, ShipmentId, UserId};
use outbox::EventEnvelope;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::OrderNumber;
use crate::status::{OrderStatus, PaymentMethod, PaymentStatus, ShippingStatus};

/// Trait for events that can be wrapped in an [`EventEnvelope`].
pub trait DomainEvent: Serialize + Send + Sync {
    /// Returns the event type name used for routing.
    fn event_type(&self) -> &'static str;

    /// Kind of entity the event is about.
    fn aggregate_type(&self) -> &'static str;

    fn aggregate_id(&self) -> AggregateId;

    fn occurred_at(&self) -> DateTime<Utc>;

    /// Wraps the event for publication.
    fn to_envelope(&self) -> Result<EventEnvelope, serde_json::Error>
    where
        Self: Sized,
    {
        Ok(EventEnvelope::builder()
            .event_type(self.event_type())
            .aggregate_type(self.aggregate_type())
            .aggregate_id(self.aggregate_id())
            .occurred_at(self.occurred_at())
            .payload(self)?
            .build())
    }
}

/// Events emitted by the fulfillment workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FulfillmentEvent {
    OrderCreated(OrderCreatedData),
    OrderStatusChanged(OrderStatusChangedData),
    OrderCancelled(OrderCancelledData),
    PaymentProcessed(PaymentProcessedData),
    PaymentStatusUpdated(PaymentStatusUpdatedData),
    ShipmentCreated(ShipmentCreatedData),
    ShipmentStatusChanged(ShipmentStatusChangedData),
    CartCleared(CartClearedData),
    StockLow(StockLowData),
}

impl DomainEvent for FulfillmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FulfillmentEvent::OrderCreated(_) => "OrderCreated",
            FulfillmentEvent::OrderStatusChanged(_) => "OrderStatusChanged",
            FulfillmentEvent::OrderCancelled(_) => "OrderCancelled",
            FulfillmentEvent::PaymentProcessed(_) => "PaymentProcessed",
            FulfillmentEvent::PaymentStatusUpdated(_) => "PaymentStatusUpdated",
            FulfillmentEvent::ShipmentCreated(_) => "ShipmentCreated",
            FulfillmentEvent::ShipmentStatusChanged(_) => "ShipmentStatusChanged",
            FulfillmentEvent::CartCleared(_) => "CartCleared",
            FulfillmentEvent::StockLow(_) => "StockLow",
        }
    }

    fn aggregate_type(&self) -> &'static str {
        match self {
            FulfillmentEvent::CartCleared(_) => "Cart",
            FulfillmentEvent::StockLow(_) => "Product",
            _ => "Order",
        }
    }

    fn aggregate_id(&self) -> AggregateId {
        match self {
            FulfillmentEvent::OrderCreated(data) => data.order_id.into(),
            FulfillmentEvent::OrderStatusChanged(data) => data.order_id.into(),
            FulfillmentEvent::OrderCancelled(data) => data.order_id.into(),
            FulfillmentEvent::PaymentProcessed(data) => data.order_id.into(),
            FulfillmentEvent::PaymentStatusUpdated(data) => data.order_id.into(),
            FulfillmentEvent::ShipmentCreated(data) => data.order_id.into(),
            FulfillmentEvent::ShipmentStatusChanged(data) => data.order_id.into(),
            FulfillmentEvent::CartCleared(data) => data.cart_id.into(),
            FulfillmentEvent::StockLow(data) => data.product_id.into(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FulfillmentEvent::OrderCreated(data) => data.created_at,
            FulfillmentEvent::OrderStatusChanged(data) => data.changed_at,
            FulfillmentEvent::OrderCancelled(data) => data.cancelled_at,
            FulfillmentEvent::PaymentProcessed(data) => data.occurred_at,
            FulfillmentEvent::PaymentStatusUpdated(data) => data.updated_at,
            FulfillmentEvent::ShipmentCreated(data) => data.created_at,
            FulfillmentEvent::ShipmentStatusChanged(data) => data.changed_at,
            FulfillmentEvent::CartCleared(data) => data.cleared_at,
            FulfillmentEvent::StockLow(data) => data.observed_at,
        }
    }
}

/// Data for OrderCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub total: Money,
    pub currency: String,
    /// Total units across all lines.
    pub item_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Data for OrderStatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Data for OrderCancelled event.
///
/// When the order had been paid, `refund_required` is set and
/// `refund_amount` carries the total to give back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub reason: String,
    pub refund_required: bool,
    pub refund_amount: Money,
    pub cancelled_at: DateTime<Utc>,
}

/// Data for PaymentProcessed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentProcessedData {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Data for PaymentStatusUpdated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusUpdatedData {
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub old_status: PaymentStatus,
    pub new_status: PaymentStatus,
    pub updated_at: DateTime<Utc>,
}

/// Data for ShipmentCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCreatedData {
    pub order_id: OrderId,
    pub shipment_id: ShipmentId,
    pub tracking_number: String,
    pub carrier: String,
    pub created_at: DateTime<Utc>,
}

/// Data for ShipmentStatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStatusChangedData {
    pub order_id: OrderId,
    pub shipment_id: ShipmentId,
    pub old_status: ShippingStatus,
    pub new_status: ShippingStatus,
    pub changed_at: DateTime<Utc>,
}

/// Data for CartCleared event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartClearedData {
    pub cart_id: CartId,
    pub user_id: UserId,
    pub reason: String,
    pub cleared_at: DateTime<Utc>,
}

/// Data for StockLow event, raised when a reservation leaves a product at or
/// below its minimum stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLowData {
    pub product_id: ProductId,
    pub stock: i64,
    pub min_stock: i64,
    pub observed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_carries_routing_and_tagged_payload() {
        let cart_id = CartId::new();
        let event = FulfillmentEvent::CartCleared(CartClearedData {
            cart_id,
            user_id: UserId::new(),
            reason: "order_created".to_string(),
            cleared_at: Utc::now(),
        });

        let envelope = event.to_envelope().unwrap();
        assert_eq!(envelope.event_type, "CartCleared");
        assert_eq!(envelope.aggregate_type, "Cart");
        assert_eq!(envelope.aggregate_id.as_uuid(), cart_id.as_uuid());
        assert_eq!(envelope.payload["type"], "CartCleared");
        assert_eq!(envelope.payload["data"]["reason"], "order_created");
    }

    #[test]
    fn test_cancelled_payload_round_trips() {
        let event = FulfillmentEvent::OrderCancelled(OrderCancelledData {
            order_id: OrderId::new(),
            user_id: UserId::new(),
            order_number: OrderNumber::generate(Utc::now()),
            reason: "changed my mind".to_string(),
            refund_required: true,
            refund_amount: Money::from_cents(2160),
            cancelled_at: Utc::now(),
        });

        let envelope = event.to_envelope().unwrap();
        let back: FulfillmentEvent = serde_json::from_value(envelope.payload).unwrap();
        match back {
            FulfillmentEvent::OrderCancelled(data) => {
                assert!(data.refund_required);
                assert_eq!(data.refund_amount, Money::from_cents(2160));
            }
            other => panic!("unexpected event {}", other.event_type()),
        }
    }

    #[test]
    fn test_stock_low_is_about_the_product() {
        let product_id = ProductId::new();
        let event = FulfillmentEvent::StockLow(StockLowData {
            product_id,
            stock: 1,
            min_stock: 2,
            observed_at: Utc::now(),
        });
        assert_eq!(event.aggregate_type(), "Product");
        assert_eq!(event.aggregate_id().as_uuid(), product_id.as_uuid());
    }
}
