pub mod error;
pub mod filter;
pub mod memory;
pub mod ports;
pub mod postgres;

pub use error::{Result, StoreError};
pub use filter::{OrderFilter, PaymentFilter, SortField};
pub use memory::{
    InMemoryAddressBook, InMemoryCartStore, InMemoryOrderRepository, InMemoryPaymentLedger,
    InMemoryProductStore,
};
pub use ports::{
    AddressBook, CartStore, InventoryLedger, OrderRepository, PaymentLedger, ProductCatalog,
};
pub use postgres::{
    PostgresOrderRepository, PostgresPaymentLedger, PostgresProductStore, run_migrations,
};
