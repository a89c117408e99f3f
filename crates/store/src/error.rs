use common::{AddressId, CartId, OrderId, PaymentId, ProductId};
use domain::{OrderError, OrderNumber};
use thiserror::Error;

/// Errors raised by repositories and ledgers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order with this ID.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// No order with this order number.
    #[error("Order not found: {0}")]
    OrderNumberNotFound(OrderNumber),

    /// Another order already uses this order number.
    #[error("Duplicate order number: {0}")]
    DuplicateOrderNumber(OrderNumber),

    /// An order with this ID was already created.
    #[error("Order already exists: {0}")]
    OrderAlreadyExists(OrderId),

    /// The order changed since it was loaded.
    #[error("Concurrency conflict for order {order_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        order_id: OrderId,
        expected: u64,
        actual: u64,
    },

    /// No product with this ID.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The product exists but is not for sale.
    #[error("Product is inactive: {0}")]
    ProductInactive(ProductId),

    /// Reserving would drive stock below zero.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// No payment with this ID.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// The order already has a completed payment.
    #[error("Order {0} already has a completed payment")]
    PaymentAlreadyCompleted(OrderId),

    /// No address with this ID.
    #[error("Address not found: {0}")]
    AddressNotFound(AddressId),

    /// No cart with this ID.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// A stored record could not be turned back into a domain value.
    #[error("Invalid stored record: {0}")]
    InvalidRecord(#[from] OrderError),

    /// The backend is not reachable.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
