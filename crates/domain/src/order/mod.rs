//! Orders: placement from a cart, reads, and status changes.

mod checkout;
mod commands;
mod model;
mod service;

pub use checkout::place_order;
pub use commands::{PlaceOrder, UpdateOrderStatus};
pub use model::{Order, OrderLine};
pub use service::OrderService;

use common::{OrderId, OrderStatus, UserId};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// The owner has nothing in their cart.
    #[error("Cart is empty")]
    CartEmpty,

    /// The owner does not exist.
    #[error("Unknown owner: {0}")]
    UnknownOwner(UserId),

    /// The order is not in a state that allows the requested status.
    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A line or order total does not fit in the money range.
    #[error("Order amount overflow")]
    AmountOverflow,

    /// The order changed status while the update was in flight.
    #[error("Order {0} was modified concurrently")]
    ConcurrentUpdate(OrderId),
}
