//! Domain error types.

use common::{OrderId, ProductId, ShipmentId};
use thiserror::Error;

use crate::money::Money;
use crate::status::{OrderStatus, PaymentStatus, ShippingStatus};

/// Errors raised by the order and payment models.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// An order must contain at least one line.
    #[error("Order has no lines")]
    EmptyOrder,

    /// Line quantities must be strictly positive.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i64 },

    /// Money components of an order cannot be negative.
    #[error("Order {field} cannot be negative: {amount}")]
    NegativeAmount { field: &'static str, amount: Money },

    /// An amount does not fit in the money range.
    #[error("Order {field} is too large")]
    AmountOverflow { field: &'static str },

    /// Totals do not satisfy total = subtotal + tax + shipping - discount.
    #[error("Order totals are inconsistent: expected {expected}, found {actual}")]
    TotalMismatch { expected: Money, actual: Money },

    /// The order status cannot move to the requested value.
    #[error("Invalid order status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// The payment status cannot move to the requested value.
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    /// The shipping status cannot move to the requested value.
    #[error("Invalid shipping status transition from {from} to {to}")]
    InvalidShippingTransition {
        from: ShippingStatus,
        to: ShippingStatus,
    },

    /// Only pending and confirmed orders can be cancelled.
    #[error("Order {order_id} cannot be cancelled in status {status}")]
    CannotBeCancelled {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// Shipments need a processing order with a completed payment.
    #[error("Order {order_id} cannot be shipped (status {status}, payment {payment_status})")]
    CannotBeShipped {
        order_id: OrderId,
        status: OrderStatus,
        payment_status: PaymentStatus,
    },

    /// The shipment does not belong to the order.
    #[error("Shipment {shipment_id} not found on order {order_id}")]
    ShipmentNotFound {
        order_id: OrderId,
        shipment_id: ShipmentId,
    },

    /// The string is not a well-formed order number.
    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(String),

    /// A status string did not name a known value.
    #[error("Unknown {kind} '{value}'")]
    UnknownStatus { kind: &'static str, value: String },
}
