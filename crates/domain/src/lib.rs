//! Domain layer for the grocery storefront.
//!
//! This crate provides the services behind the storefront:
//! - Catalog browsing and maintenance
//! - Carts made of independent lines
//! - Order placement, converting a cart into an order in one transaction
//! - Order lifecycle and delivery tracking
//!
//! Services are generic over the repository traits from the `store` crate, so
//! the same code runs against PostgreSQL and the in-memory store.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;

pub use account::{CreateUser, UserService};
pub use cart::{AddToCart, Cart, CartError, CartService};
pub use catalog::{CatalogService, CreateProduct, ProductSnapshot, UpdateProduct};
pub use delivery::{
    CreateDelivery, Delivery, DeliveryError, DeliveryService, DeliveryTracking, UpdateDelivery,
};
pub use error::{DomainError, ValidationError};
pub use money::{Money, MoneyError};
pub use order::{Order, OrderError, OrderLine, OrderService, PlaceOrder, UpdateOrderStatus};
pub use pricing::{PricedCart, PricedLine, price_cart, price_line};
