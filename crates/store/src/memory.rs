use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::{
    CartLineId, DeliveryId, DeliveryStatus, OrderId, OrderLineId, OrderStatus, ProductId, UserId,
};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

use crate::records::{
    CartLineRecord, CartLineWithProduct, DeliveryChanges, DeliveryRecord, NewCartLine,
    NewDelivery, NewOrder, NewOrderLine, NewProduct, NewUser, OrderLineRecord,
    OrderLineWithProduct, OrderRecord, ProductChanges, ProductFilter, ProductRecord,
    ProductSummary, UserRecord,
};
use crate::store::{
    CartRepository, CatalogRepository, CheckoutTransaction, DeliveryRepository, OrderRepository,
    UserRepository,
};
use crate::{Result, StoreError};

/// Points at which the in-memory store can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `CheckoutTransaction::insert_order`
    InsertOrder,
    /// `CheckoutTransaction::insert_order_lines`
    InsertOrderLines,
    /// `CheckoutTransaction::clear_cart`
    ClearCart,
}

#[derive(Debug, Default)]
struct Faults {
    insert_order: AtomicBool,
    insert_order_lines: AtomicBool,
    clear_cart: AtomicBool,
}

impl Faults {
    fn flag(&self, point: FaultPoint) -> &AtomicBool {
        match point {
            FaultPoint::InsertOrder => &self.insert_order,
            FaultPoint::InsertOrderLines => &self.insert_order_lines,
            FaultPoint::ClearCart => &self.clear_cart,
        }
    }

    fn check(&self, point: FaultPoint) -> Result<()> {
        if self.flag(point).load(Ordering::SeqCst) {
            tracing::warn!(?point, "failing checkout step on request");
            return Err(StoreError::Unavailable(format!("injected fault at {point:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    products: BTreeMap<ProductId, ProductRecord>,
    cart_lines: BTreeMap<CartLineId, CartLineRecord>,
    orders: BTreeMap<OrderId, OrderRecord>,
    order_lines: BTreeMap<OrderLineId, OrderLineRecord>,
    deliveries: BTreeMap<DeliveryId, DeliveryRecord>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn cart_lines_with_products(&self, user_id: UserId) -> Result<Vec<CartLineWithProduct>> {
        self.cart_lines
            .values()
            .filter(|line| line.user_id == user_id)
            .map(|line| {
                let product = self.products.get(&line.product_id).ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "cart line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(CartLineWithProduct {
                    line: line.clone(),
                    product: product.clone(),
                })
            })
            .collect()
    }

    fn clear_cart(&mut self, user_id: UserId) -> u64 {
        let before = self.cart_lines.len();
        self.cart_lines.retain(|_, line| line.user_id != user_id);
        (before - self.cart_lines.len()) as u64
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<OrderRecord> {
        if !self.users.contains_key(&order.user_id) {
            return Err(StoreError::ForeignKey("orders_user_id_fkey".to_string()));
        }
        let now = Utc::now();
        let record = OrderRecord {
            id: OrderId::new(self.next_id()),
            user_id: order.user_id,
            total_amount: order.total_amount,
            status: OrderStatus::Pending,
            delivery_address: order.delivery_address,
            delivery_phone: order.delivery_phone,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        };
        self.orders.insert(record.id, record.clone());
        Ok(record)
    }

    fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: Vec<NewOrderLine>,
    ) -> Result<Vec<OrderLineRecord>> {
        if !self.orders.contains_key(&order_id) {
            return Err(StoreError::ForeignKey("order_items_order_id_fkey".to_string()));
        }
        if lines
            .iter()
            .any(|line| !self.products.contains_key(&line.product_id))
        {
            return Err(StoreError::ForeignKey(
                "order_items_product_id_fkey".to_string(),
            ));
        }

        let now = Utc::now();
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            let record = OrderLineRecord {
                id: OrderLineId::new(self.next_id()),
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total,
                created_at: now,
            };
            self.order_lines.insert(record.id, record.clone());
            records.push(record);
        }
        Ok(records)
    }
}

/// In-memory store implementation for testing.
///
/// Provides the same interface as the PostgreSQL implementation. Checkout
/// transactions hold the write lock and work on a private copy of the tables,
/// which replaces the shared state only on commit.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given checkout step fail (or succeed again) on later calls.
    pub fn set_fault(&self, point: FaultPoint, fail: bool) {
        self.faults.flag(point).store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the total number of order lines stored.
    pub async fn order_line_count(&self) -> usize {
        self.tables.read().await.order_lines.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }
        let record = UserRecord {
            id: UserId::new(tables.next_id()),
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            created_at: Utc::now(),
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        Ok(self.tables.read().await.products.get(&product_id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        let tables = self.tables.read().await;
        let mut categories: Vec<String> = tables
            .products
            .values()
            .map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let record = ProductRecord {
            id: ProductId::new(tables.next_id()),
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            unit: product.unit,
            image_url: product.image_url,
            is_available: product.is_available,
            stock_quantity: product.stock_quantity,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_product(
        &self,
        product_id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>> {
        let mut tables = self.tables.write().await;
        let Some(product) = tables.products.get_mut(&product_id) else {
            return Ok(None);
        };
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(is_available) = changes.is_available {
            product.is_available = is_available;
        }
        if let Some(stock_quantity) = changes.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }
}

#[async_trait]
impl CartRepository for InMemoryStore {
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLineWithProduct>> {
        self.tables.read().await.cart_lines_with_products(user_id)
    }

    async fn insert_line(&self, line: NewCartLine) -> Result<CartLineRecord> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&line.user_id) {
            return Err(StoreError::ForeignKey("cart_items_user_id_fkey".to_string()));
        }
        if !tables.products.contains_key(&line.product_id) {
            return Err(StoreError::ForeignKey(
                "cart_items_product_id_fkey".to_string(),
            ));
        }
        let record = CartLineRecord {
            id: CartLineId::new(tables.next_id()),
            user_id: line.user_id,
            product_id: line.product_id,
            quantity: line.quantity,
            created_at: Utc::now(),
        };
        tables.cart_lines.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_line_quantity(
        &self,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLineRecord>> {
        let mut tables = self.tables.write().await;
        Ok(tables.cart_lines.get_mut(&line_id).map(|line| {
            line.quantity = quantity;
            line.clone()
        }))
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<bool> {
        Ok(self
            .tables
            .write()
            .await
            .cart_lines
            .remove(&line_id)
            .is_some())
    }

    async fn clear(&self, user_id: UserId) -> Result<u64> {
        Ok(self.tables.write().await.clear_cart(user_id))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>> {
        let guard = self.tables.clone().write_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryCheckout {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.tables.read().await.orders.get(&order_id).cloned())
    }

    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineWithProduct>> {
        let tables = self.tables.read().await;
        tables
            .order_lines
            .values()
            .filter(|line| line.order_id == order_id)
            .map(|line| {
                let product = tables.products.get(&line.product_id).ok_or_else(|| {
                    StoreError::Corrupt(format!(
                        "order line {} references missing product {}",
                        line.id, line.product_id
                    ))
                })?;
                Ok(OrderLineWithProduct {
                    line: line.clone(),
                    product: ProductSummary::from(product),
                })
            })
            .collect()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<OrderRecord>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .orders
            .get_mut(&order_id)
            .filter(|order| order.status == expected)
            .map(|order| {
                order.status = next;
                order.updated_at = Utc::now();
                order.clone()
            }))
    }
}

#[async_trait]
impl DeliveryRepository for InMemoryStore {
    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<DeliveryRecord> {
        let mut tables = self.tables.write().await;
        if !tables.orders.contains_key(&delivery.order_id) {
            return Err(StoreError::ForeignKey(
                "deliveries_order_id_fkey".to_string(),
            ));
        }
        let now = Utc::now();
        let record = DeliveryRecord {
            id: DeliveryId::new(tables.next_id()),
            order_id: delivery.order_id,
            status: DeliveryStatus::Pending,
            estimated_delivery_at: delivery.estimated_delivery_at,
            actual_delivery_at: None,
            courier_name: delivery.courier_name,
            courier_phone: delivery.courier_phone,
            tracking_notes: delivery.tracking_notes,
            created_at: now,
            updated_at: now,
        };
        tables.deliveries.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_delivery(&self, delivery_id: DeliveryId) -> Result<Option<DeliveryRecord>> {
        Ok(self.tables.read().await.deliveries.get(&delivery_id).cloned())
    }

    async fn first_delivery_for_order(&self, order_id: OrderId) -> Result<Option<DeliveryRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .deliveries
            .values()
            .find(|d| d.order_id == order_id)
            .cloned())
    }

    async fn update_delivery(
        &self,
        delivery_id: DeliveryId,
        changes: DeliveryChanges,
    ) -> Result<Option<DeliveryRecord>> {
        let mut tables = self.tables.write().await;
        let Some(delivery) = tables.deliveries.get_mut(&delivery_id) else {
            return Ok(None);
        };
        if let Some(status) = changes.status {
            delivery.status = status;
        }
        if let Some(at) = changes.estimated_delivery_at {
            delivery.estimated_delivery_at = Some(at);
        }
        if let Some(at) = changes.actual_delivery_at {
            delivery.actual_delivery_at = Some(at);
        }
        if let Some(name) = changes.courier_name {
            delivery.courier_name = Some(name);
        }
        if let Some(phone) = changes.courier_phone {
            delivery.courier_phone = Some(phone);
        }
        if let Some(notes) = changes.tracking_notes {
            delivery.tracking_notes = Some(notes);
        }
        delivery.updated_at = Utc::now();
        Ok(Some(delivery.clone()))
    }
}

struct InMemoryCheckout {
    guard: OwnedRwLockWriteGuard<Tables>,
    working: Tables,
    faults: Arc<Faults>,
}

#[async_trait]
impl CheckoutTransaction for InMemoryCheckout {
    async fn user_exists(&mut self, user_id: UserId) -> Result<bool> {
        Ok(self.working.users.contains_key(&user_id))
    }

    async fn lock_cart_lines(&mut self, user_id: UserId) -> Result<Vec<CartLineWithProduct>> {
        self.working.cart_lines_with_products(user_id)
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRecord> {
        self.faults.check(FaultPoint::InsertOrder)?;
        self.working.insert_order(order)
    }

    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: Vec<NewOrderLine>,
    ) -> Result<Vec<OrderLineRecord>> {
        self.faults.check(FaultPoint::InsertOrderLines)?;
        self.working.insert_order_lines(order_id, lines)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<u64> {
        self.faults.check(FaultPoint::ClearCart)?;
        Ok(self.working.clear_cart(user_id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryCheckout {
            mut guard, working, ..
        } = *self;
        *guard = working;
        tracing::debug!("in-memory checkout committed");
        Ok(())
    }
}
