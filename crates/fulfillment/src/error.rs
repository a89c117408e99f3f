//! Workflow error types.

use common::{AddressId, CartId, OrderId, PaymentId, ProductId, ShipmentId, UserId};
use domain::{Money, OrderError, OrderNumber, OrderStatus, PaymentStatus, ShippingStatus};
use store::StoreError;
use thiserror::Error;

/// Broad class of a failure, for callers mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or violates a business rule.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// The request lost a race or collides with existing state.
    Conflict,
    /// The entity is in a state that does not allow the operation.
    State,
    /// The caller does not own the entity.
    Forbidden,
    /// Storage or runtime failure; nothing the caller did wrong.
    Infrastructure,
}

/// Errors returned by the fulfillment workflow.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// An order request had no lines.
    #[error("Order has no lines")]
    EmptyOrder,

    /// A requested quantity was zero, negative or too large.
    #[error("Invalid quantity {quantity} for product {product_id} on line {line}")]
    InvalidQuantity {
        line: usize,
        product_id: ProductId,
        quantity: i64,
    },

    /// The product is not for sale.
    #[error("Product is inactive: {0}")]
    ProductInactive(ProductId),

    /// A client-supplied order number is malformed.
    #[error("Invalid order number: {0}")]
    InvalidOrderNumber(String),

    /// Payment was rejected before anything was recorded.
    #[error("Payment failed for order {order_id}: expected {expected}, received {received}")]
    PaymentFailed {
        order_id: OrderId,
        expected: Money,
        received: Money,
    },

    /// The user has no cart or the cart has no lines.
    #[error("Cart is empty for user {0}")]
    CartEmpty(UserId),

    /// Any other rule enforced by the order model.
    #[error("Invalid order: {0}")]
    InvalidOrder(OrderError),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order not found: {0}")]
    OrderNumberNotFound(OrderNumber),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Address not found: {0}")]
    AddressNotFound(AddressId),

    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("No payment with transaction reference {0}")]
    PaymentReferenceNotFound(String),

    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    #[error("Shipment {shipment_id} not found on order {order_id}")]
    ShipmentNotFound {
        order_id: OrderId,
        shipment_id: ShipmentId,
    },

    /// Not enough stock to reserve a line.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(OrderNumber),

    #[error("Order already exists: {0}")]
    OrderAlreadyExists(OrderId),

    #[error("Order {0} already has a completed payment")]
    PaymentAlreadyCompleted(OrderId),

    /// The order was changed by someone else since it was read.
    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(OrderId),

    #[error("Order {order_id} cannot be cancelled in status {status}")]
    OrderCannotBeCancelled {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("Order {order_id} cannot be shipped (status {status}, payment {payment_status})")]
    OrderCannotBeShipped {
        order_id: OrderId,
        status: OrderStatus,
        payment_status: PaymentStatus,
    },

    /// Cancelled and refunded orders no longer accept payments.
    #[error("Order {order_id} cannot be paid in status {status}")]
    OrderNotPayable {
        order_id: OrderId,
        status: OrderStatus,
    },

    #[error("Invalid order status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Invalid shipping status transition from {from} to {to}")]
    InvalidShippingTransition {
        from: ShippingStatus,
        to: ShippingStatus,
    },

    /// The address belongs to another user.
    #[error("Address {0} does not belong to the user")]
    AddressNotOwned(AddressId),

    /// The order belongs to another user.
    #[error("Order {order_id} does not belong to user {user_id}")]
    NotOrderOwner { order_id: OrderId, user_id: UserId },

    /// Storage failure.
    #[error("Store error: {0}")]
    Store(StoreError),

    /// A spawned step panicked or was aborted.
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl FulfillmentError {
    pub fn kind(&self) -> ErrorKind {
        use FulfillmentError::*;
        match self {
            EmptyOrder
            | InvalidQuantity { .. }
            | ProductInactive(_)
            | InvalidOrderNumber(_)
            | PaymentFailed { .. }
            | CartEmpty(_)
            | InvalidOrder(_) => ErrorKind::Validation,

            OrderNotFound(_)
            | OrderNumberNotFound(_)
            | ProductNotFound(_)
            | AddressNotFound(_)
            | PaymentNotFound(_)
            | PaymentReferenceNotFound(_)
            | CartNotFound(_)
            | ShipmentNotFound { .. } => ErrorKind::NotFound,

            InsufficientStock { .. }
            | DuplicateOrderNumber(_)
            | OrderAlreadyExists(_)
            | PaymentAlreadyCompleted(_)
            | ConcurrentModification(_) => ErrorKind::Conflict,

            OrderCannotBeCancelled { .. }
            | OrderCannotBeShipped { .. }
            | OrderNotPayable { .. }
            | InvalidStatusTransition { .. }
            | InvalidPaymentTransition { .. }
            | InvalidShippingTransition { .. } => ErrorKind::State,

            AddressNotOwned(_) | NotOrderOwner { .. } => ErrorKind::Forbidden,

            Store(_) | TaskFailed(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<OrderError> for FulfillmentError {
    fn from(error: OrderError) -> Self {
        match error {
            OrderError::EmptyOrder => FulfillmentError::EmptyOrder,
            OrderError::InvalidOrderNumber(value) => FulfillmentError::InvalidOrderNumber(value),
            OrderError::CannotBeCancelled { order_id, status } => {
                FulfillmentError::OrderCannotBeCancelled { order_id, status }
            }
            OrderError::CannotBeShipped {
                order_id,
                status,
                payment_status,
            } => FulfillmentError::OrderCannotBeShipped {
                order_id,
                status,
                payment_status,
            },
            OrderError::InvalidStatusTransition { from, to } => {
                FulfillmentError::InvalidStatusTransition { from, to }
            }
            OrderError::InvalidPaymentTransition { from, to } => {
                FulfillmentError::InvalidPaymentTransition { from, to }
            }
            OrderError::InvalidShippingTransition { from, to } => {
                FulfillmentError::InvalidShippingTransition { from, to }
            }
            OrderError::ShipmentNotFound {
                order_id,
                shipment_id,
            } => FulfillmentError::ShipmentNotFound {
                order_id,
                shipment_id,
            },
            other => FulfillmentError::InvalidOrder(other),
        }
    }
}

impl From<StoreError> for FulfillmentError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::OrderNotFound(id) => FulfillmentError::OrderNotFound(id),
            StoreError::OrderNumberNotFound(number) => {
                FulfillmentError::OrderNumberNotFound(number)
            }
            StoreError::DuplicateOrderNumber(number) => {
                FulfillmentError::DuplicateOrderNumber(number)
            }
            StoreError::OrderAlreadyExists(id) => FulfillmentError::OrderAlreadyExists(id),
            StoreError::ConcurrencyConflict { order_id, .. } => {
                FulfillmentError::ConcurrentModification(order_id)
            }
            StoreError::ProductNotFound(id) => FulfillmentError::ProductNotFound(id),
            StoreError::ProductInactive(id) => FulfillmentError::ProductInactive(id),
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => FulfillmentError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            StoreError::PaymentNotFound(id) => FulfillmentError::PaymentNotFound(id),
            StoreError::PaymentAlreadyCompleted(id) => {
                FulfillmentError::PaymentAlreadyCompleted(id)
            }
            StoreError::AddressNotFound(id) => FulfillmentError::AddressNotFound(id),
            StoreError::CartNotFound(id) => FulfillmentError::CartNotFound(id),
            other => FulfillmentError::Store(other),
        }
    }
}

/// Convenience type alias for workflow results.
pub type Result<T> = std::result::Result<T, FulfillmentError>;
