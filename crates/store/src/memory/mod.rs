//! In-memory implementations of every storage port.
//!
//! They behave like the PostgreSQL backends, including uniqueness and
//! version checks, and can be told to fail so callers' error paths can be
//! exercised.

mod addresses;
mod carts;
mod orders;
mod payments;
mod products;

pub use addresses::InMemoryAddressBook;
pub use carts::InMemoryCartStore;
pub use orders::InMemoryOrderRepository;
pub use payments::InMemoryPaymentLedger;
pub use products::InMemoryProductStore;
