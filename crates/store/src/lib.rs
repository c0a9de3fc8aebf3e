//! Persistence context for the grocery storefront.
//!
//! The domain layer talks to storage only through the repository traits in
//! [`store`]. Two backends implement them: [`PostgresStore`] for production and
//! [`InMemoryStore`] for tests, which can also inject faults into checkout steps.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod records;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{FaultPoint, InMemoryStore};
pub use postgres::PostgresStore;
pub use records::{
    CartLineRecord, CartLineWithProduct, DeliveryChanges, DeliveryRecord, NewCartLine,
    NewDelivery, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderLineWithProduct, OrderRecord, ProductChanges, ProductFilter, ProductRecord,
    ProductSummary, UserRecord,
};
pub use store::{
    CartRepository, CatalogRepository, CheckoutTransaction, DeliveryRepository, OrderRepository,
    Store, UserRepository,
};
