//! Typed requests and their dispatch to the workflow.
//!
//! Every request type names its response type and is handled by exactly one
//! [`Handler`] implementation on [`OrderWorkflow`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{AddressId, OrderId, PaymentId, ShipmentId, UserId};
use domain::{Money, Order, OrderStatus, Payment, PaymentMethod, PaymentStatus, Shipment, ShippingStatus};
use serde::{Deserialize, Serialize};
use store::{OrderFilter, PaymentFilter};

use crate::builder::LineRequest;
use crate::error::Result;
use crate::summary::OrderSummary;
use crate::workflow::OrderWorkflow;

/// A request the workflow can handle.
pub trait Request: Send + 'static {
    /// What a successful request produces.
    type Response: Send;

    /// Name used in logs.
    const NAME: &'static str;
}

/// Handles one kind of request.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync {
    async fn handle(&self, request: R) -> Result<R::Response>;
}

/// Places an order from explicit lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub user_id: UserId,
    pub lines: Vec<LineRequest>,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub notes: Option<String>,
    /// Client-chosen order number, validated and checked for uniqueness.
    pub order_number: Option<String>,
}

impl CreateOrder {
    pub fn new(
        user_id: UserId,
        lines: Vec<LineRequest>,
        shipping_address_id: AddressId,
        billing_address_id: AddressId,
    ) -> Self {
        Self {
            user_id,
            lines,
            shipping_address_id,
            billing_address_id,
            notes: None,
            order_number: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_order_number(mut self, order_number: impl Into<String>) -> Self {
        self.order_number = Some(order_number.into());
        self
    }
}

/// Places an order from the user's cart and clears the cart on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderFromCart {
    pub user_id: UserId,
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub notes: Option<String>,
}

impl CreateOrderFromCart {
    pub fn new(user_id: UserId, shipping_address_id: AddressId, billing_address_id: AddressId) -> Self {
        Self {
            user_id,
            shipping_address_id,
            billing_address_id,
            notes: None,
        }
    }
}

/// Cancels an order on behalf of its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub reason: String,
}

impl CancelOrder {
    pub fn new(order_id: OrderId, user_id: UserId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            user_id,
            reason: reason.into(),
        }
    }
}

/// Operator-driven status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub reason: Option<String>,
}

impl UpdateOrderStatus {
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self {
            order_id,
            status,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Result reported by the payment gateway for an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Approved,
    Declined { reason: String },
}

/// Records a payment attempt against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_ref: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    pub outcome: PaymentOutcome,
}

impl ProcessPayment {
    /// An approved payment with no gateway details.
    pub fn approved(order_id: OrderId, amount: Money, method: PaymentMethod) -> Self {
        Self {
            order_id,
            amount,
            method,
            transaction_ref: None,
            gateway_response: None,
            outcome: PaymentOutcome::Approved,
        }
    }

    pub fn declined(
        order_id: OrderId,
        amount: Money,
        method: PaymentMethod,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            outcome: PaymentOutcome::Declined {
                reason: reason.into(),
            },
            ..Self::approved(order_id, amount, method)
        }
    }

    pub fn with_transaction_ref(mut self, transaction_ref: impl Into<String>) -> Self {
        self.transaction_ref = Some(transaction_ref.into());
        self
    }

    pub fn with_gateway_response(mut self, response: serde_json::Value) -> Self {
        self.gateway_response = Some(response);
        self
    }
}

/// Moves an existing payment, typically from a gateway callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePaymentStatus {
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub transaction_ref: Option<String>,
    pub gateway_response: Option<serde_json::Value>,
    /// Stored when the new status is `Failed`.
    pub failure_reason: Option<String>,
}

impl UpdatePaymentStatus {
    pub fn new(payment_id: PaymentId, status: PaymentStatus) -> Self {
        Self {
            payment_id,
            status,
            transaction_ref: None,
            gateway_response: None,
            failure_reason: None,
        }
    }

    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShipment {
    pub order_id: OrderId,
    pub tracking_number: String,
    pub carrier: String,
    pub estimated_delivery: Option<NaiveDate>,
}

impl CreateShipment {
    pub fn new(order_id: OrderId, tracking_number: impl Into<String>, carrier: impl Into<String>) -> Self {
        Self {
            order_id,
            tracking_number: tracking_number.into(),
            carrier: carrier.into(),
            estimated_delivery: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateShipmentStatus {
    pub order_id: OrderId,
    pub shipment_id: ShipmentId,
    pub status: ShippingStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetOrder {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderByNumber {
    pub order_number: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListOrders {
    pub filter: OrderFilter,
}

#[derive(Debug, Clone)]
pub struct GetUserOrders {
    pub user_id: UserId,
    pub filter: OrderFilter,
}

/// Orders ready for warehouse work.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GetOrdersToProcess;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetOrderPayments {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetPayment {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPaymentByTransactionRef {
    pub transaction_ref: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListPayments {
    pub filter: PaymentFilter,
}

/// Order statistics, optionally for one user and a placement window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GetOrderSummary {
    pub user_id: Option<UserId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

macro_rules! requests {
    ($($request:ty => $response:ty, $name:literal, $method:ident;)*) => {
        $(
            impl Request for $request {
                type Response = $response;
                const NAME: &'static str = $name;
            }

            #[async_trait]
            impl Handler<$request> for OrderWorkflow {
                async fn handle(&self, request: $request) -> Result<$response> {
                    tracing::debug!(request = <$request as Request>::NAME, "handling request");
                    self.$method(request).await
                }
            }
        )*
    };
}

requests! {
    CreateOrder => Order, "create_order", create_order;
    CreateOrderFromCart => Order, "create_order_from_cart", create_order_from_cart;
    CancelOrder => Order, "cancel_order", cancel_order;
    UpdateOrderStatus => Order, "update_order_status", update_order_status;
    ProcessPayment => Payment, "process_payment", process_payment;
    UpdatePaymentStatus => Payment, "update_payment_status", update_payment_status;
    CreateShipment => Shipment, "create_shipment", create_shipment;
    UpdateShipmentStatus => Order, "update_shipment_status", update_shipment_status;
    GetOrder => Order, "get_order", get_order;
    GetOrderByNumber => Order, "get_order_by_number", get_order_by_number;
    ListOrders => Vec<Order>, "list_orders", list_orders;
    GetUserOrders => Vec<Order>, "get_user_orders", get_user_orders;
    GetOrdersToProcess => Vec<Order>, "get_orders_to_process", get_orders_to_process;
    GetOrderPayments => Vec<Payment>, "get_order_payments", get_order_payments;
    GetPayment => Payment, "get_payment", get_payment;
    GetPaymentByTransactionRef => Payment, "get_payment_by_transaction_ref", get_payment_by_transaction_ref;
    ListPayments => Vec<Payment>, "list_payments", list_payments;
    GetOrderSummary => OrderSummary, "get_order_summary", get_order_summary;
}
