pub mod address;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod events;
pub mod money;
pub mod order;
pub mod payment;
pub mod pricing;
pub mod status;

pub use address::{Address, AddressSnapshot};
pub use cart::{Cart, CartLine};
pub use catalog::{Product, StockLevel};
pub use common::{AddressId, AggregateId, CartId, OrderId, PaymentId, ProductId, ShipmentId, UserId};
pub use error::OrderError;
pub use events::{
    CartClearedData, DomainEvent, FulfillmentEvent, OrderCancelledData, OrderCreatedData,
    OrderStatusChangedData, PaymentProcessedData, PaymentStatusUpdatedData, ShipmentCreatedData,
    ShipmentStatusChangedData, StockLowData,
};
pub use money::Money;
pub use order::{NewOrder, Order, OrderLine, OrderNumber, OrderTotals, Shipment};
pub use payment::{NewPayment, Payment};
pub use pricing::{FlatRateTax, TaxPolicy};
pub use status::{OrderStatus, PaymentMethod, PaymentStatus, ShippingStatus};
