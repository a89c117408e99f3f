//! Storage traits the fulfillment workflow depends on.

use async_trait::async_trait;
use common::{AddressId, CartId, OrderId, PaymentId, ProductId, UserId};
use domain::{Address, Cart, Order, OrderNumber, Payment, Product, StockLevel};

use crate::{OrderFilter, PaymentFilter, Result};

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fails with `ProductNotFound` if the product does not exist.
    async fn get_product(&self, product_id: ProductId) -> Result<Product>;
}

/// Authoritative stock counters.
///
/// Both operations act on the current persisted value and are serialized per
/// product: two reservations of the last unit can never both succeed.
/// Different products never contend with each other.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Decrements stock by `quantity`.
    ///
    /// Fails with `InsufficientStock` if fewer units remain, with
    /// `ProductInactive` if the product is not for sale and with
    /// `ProductNotFound` if it does not exist. Stock never goes negative.
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel>;

    /// Increments stock by `quantity`. Never fails for business reasons.
    async fn restore(&self, product_id: ProductId, quantity: u32) -> Result<StockLevel>;

    /// Reads the current counter.
    async fn stock_level(&self, product_id: ProductId) -> Result<StockLevel>;
}

/// Durable storage of orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a new order.
    ///
    /// Fails with `DuplicateOrderNumber` if the number is taken.
    async fn create(&self, order: &Order) -> Result<()>;

    async fn get_by_id(&self, order_id: OrderId) -> Result<Order>;

    async fn get_by_order_number(&self, order_number: &OrderNumber) -> Result<Order>;

    /// Replaces the stored order if its version still matches.
    ///
    /// On success the order's version is bumped. A stale version fails with
    /// `ConcurrencyConflict` and leaves the stored order untouched.
    async fn update(&self, order: &mut Order) -> Result<()>;

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>>;

    /// Orders that are confirmed or processing and already paid.
    async fn get_orders_to_process(&self) -> Result<Vec<Order>>;

    async fn get_by_user_id(&self, user_id: UserId, filter: &OrderFilter) -> Result<Vec<Order>> {
        let filter = filter.clone().user_id(user_id);
        self.list(&filter).await
    }

    async fn order_number_exists(&self, order_number: &OrderNumber) -> Result<bool> {
        match self.get_by_order_number(order_number).await {
            Ok(_) => Ok(true),
            Err(crate::StoreError::OrderNumberNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Durable storage of payment records.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Inserts a payment.
    ///
    /// Fails with `PaymentAlreadyCompleted` if the payment is completed and
    /// another completed payment exists for the same order.
    async fn record(&self, payment: &Payment) -> Result<()>;

    /// Replaces a payment, with the same completed-payment check as `record`.
    async fn update(&self, payment: &Payment) -> Result<()>;

    async fn get(&self, payment_id: PaymentId) -> Result<Payment>;

    /// Payments of an order, newest first.
    async fn list_for_order(&self, order_id: OrderId) -> Result<Vec<Payment>>;

    /// Newest payment carrying the gateway's transaction reference.
    async fn get_by_transaction_ref(&self, transaction_ref: &str) -> Result<Option<Payment>>;

    /// Payments matching the filter, newest first.
    async fn list(&self, filter: &PaymentFilter) -> Result<Vec<Payment>>;

    async fn has_completed(&self, order_id: OrderId) -> Result<bool> {
        Ok(self
            .list_for_order(order_id)
            .await?
            .iter()
            .any(Payment::is_completed))
    }
}

/// The user's saved addresses.
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Fails with `AddressNotFound` if the address does not exist.
    async fn get_address(&self, address_id: AddressId) -> Result<Address>;
}

/// Shopping carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn get_cart_for_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Removes every line from the cart.
    async fn clear_cart(&self, cart_id: CartId) -> Result<()>;
}
