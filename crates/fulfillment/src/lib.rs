pub mod builder;
pub mod config;
pub mod error;
pub mod requests;
pub mod summary;
pub mod workflow;

pub use builder::{LineRequest, OrderBuilder, OrderDraft};
pub use config::FulfillmentConfig;
pub use error::{ErrorKind, FulfillmentError, Result};
pub use requests::{
    CancelOrder, CreateOrder, CreateOrderFromCart, CreateShipment, GetOrder, GetOrderByNumber,
    GetOrderPayments, GetOrderSummary, GetOrdersToProcess, GetPayment, GetPaymentByTransactionRef,
    GetUserOrders, Handler, ListOrders, ListPayments, PaymentOutcome, ProcessPayment, Request,
    UpdateOrderStatus, UpdatePaymentStatus, UpdateShipmentStatus,
};
pub use summary::OrderSummary;
pub use workflow::{Collaborators, OrderWorkflow};
