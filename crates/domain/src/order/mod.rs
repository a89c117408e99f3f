//! The order aggregate and the values it is built from.

mod aggregate;
mod line;
mod number;
mod shipment;

pub use aggregate::{NewOrder, Order};
pub use line::{OrderLine, OrderTotals};
pub use number::OrderNumber;
pub use shipment::Shipment;
