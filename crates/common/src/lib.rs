pub mod types;

pub use types::{
    AddressId, AggregateId, CartId, EventId, OrderId, PaymentId, ProductId, ShipmentId, UserId,
};
