use async_trait::async_trait;
use common::{CartLineId, DeliveryId, OrderId, OrderStatus, ProductId, UserId};

use crate::Result;
use crate::records::{
    CartLineRecord, CartLineWithProduct, DeliveryChanges, DeliveryRecord, NewCartLine,
    NewDelivery, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderLineWithProduct, OrderRecord, ProductChanges, ProductFilter, ProductRecord, UserRecord,
};

/// Storefront accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails with `Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord>;

    /// Retrieves a user by id.
    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRecord>>;
}

/// The product catalog.
///
/// Listing operations are read-only and return products ordered by name,
/// then id, so identical filters yield identical results.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Lists products passing the filter.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>>;

    /// Retrieves a product by id.
    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>>;

    /// Returns the distinct category names in ascending order.
    async fn list_categories(&self) -> Result<Vec<String>>;

    /// Inserts a product.
    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord>;

    /// Applies a partial update. Returns None if the product doesn't exist.
    async fn update_product(
        &self,
        product_id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>>;
}

/// Per-user cart lines.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Lists a user's cart lines joined with their products, ordered by line id.
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLineWithProduct>>;

    /// Inserts a new line. Existing lines for the same product are left alone.
    async fn insert_line(&self, line: NewCartLine) -> Result<CartLineRecord>;

    /// Sets a line's quantity. Returns None if the line doesn't exist.
    async fn update_line_quantity(
        &self,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLineRecord>>;

    /// Deletes a line. Returns false if it didn't exist.
    async fn delete_line(&self, line_id: CartLineId) -> Result<bool>;

    /// Deletes every line of a user's cart, returning how many were removed.
    async fn clear(&self, user_id: UserId) -> Result<u64>;
}

/// The order ledger.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Opens a checkout transaction.
    ///
    /// Nothing written through the transaction is visible to other readers
    /// until [`CheckoutTransaction::commit`] succeeds. Dropping it without
    /// committing discards every write.
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>>;

    /// Retrieves an order by id.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Lists an order's lines with product details, ordered by line id.
    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineWithProduct>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;

    /// Moves an order from `expected` to `next`.
    ///
    /// Returns None if the order doesn't exist or is no longer in `expected`.
    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<OrderRecord>>;
}

/// Deliveries attached to orders.
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Inserts a delivery in `pending` status.
    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<DeliveryRecord>;

    /// Retrieves a delivery by id.
    async fn get_delivery(&self, delivery_id: DeliveryId) -> Result<Option<DeliveryRecord>>;

    /// Retrieves the earliest delivery created for an order.
    async fn first_delivery_for_order(&self, order_id: OrderId) -> Result<Option<DeliveryRecord>>;

    /// Applies a partial update. Returns None if the delivery doesn't exist.
    async fn update_delivery(
        &self,
        delivery_id: DeliveryId,
        changes: DeliveryChanges,
    ) -> Result<Option<DeliveryRecord>>;
}

/// The writes of one order placement, applied all-or-nothing.
#[async_trait]
pub trait CheckoutTransaction: Send {
    /// Returns true if the user exists.
    async fn user_exists(&mut self, user_id: UserId) -> Result<bool>;

    /// Reads a user's cart lines with their products and holds them until the
    /// transaction ends, so a concurrent checkout cannot consume the same lines.
    async fn lock_cart_lines(&mut self, user_id: UserId) -> Result<Vec<CartLineWithProduct>>;

    /// Inserts a `pending` order.
    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRecord>;

    /// Inserts the lines of an order, in the given order.
    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: Vec<NewOrderLine>,
    ) -> Result<Vec<OrderLineRecord>>;

    /// Deletes every cart line of the user, returning how many were removed.
    async fn clear_cart(&mut self, user_id: UserId) -> Result<u64>;

    /// Makes every write of this transaction durable and visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// The full persistence context handed to the domain services.
pub trait Store:
    UserRepository
    + CatalogRepository
    + CartRepository
    + OrderRepository
    + DeliveryRepository
    + Clone
    + 'static
{
}

// Blanket implementation for every type providing all repositories
impl<T> Store for T where
    T: UserRepository
        + CatalogRepository
        + CartRepository
        + OrderRepository
        + DeliveryRepository
        + Clone
        + 'static
{
}
