//! Shared types for the grocery storefront workspace.

mod status;
mod types;

pub use status::{DeliveryStatus, OrderStatus, UnknownStatus};
pub use types::{CartLineId, DeliveryId, OrderId, OrderLineId, ProductId, UserId};
