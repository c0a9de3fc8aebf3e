//! HTTP handlers grouped by resource.

pub mod cart;
pub mod catalog;
pub mod deliveries;
pub mod ops;
pub mod orders;
pub mod users;

use domain::{CartService, CatalogService, DeliveryService, OrderService, UserService};
use store::Store;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub users: UserService<S>,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub deliveries: DeliveryService<S>,
    pub store: S,
}

impl<S: Store> AppState<S> {
    /// Builds every service on top of the same store.
    pub fn new(store: S) -> Self {
        Self {
            users: UserService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            deliveries: DeliveryService::new(store.clone()),
            store,
        }
    }
}
