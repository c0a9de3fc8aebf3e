use async_trait::async_trait;
use common::{
    CartLineId, DeliveryId, DeliveryStatus, OrderId, OrderLineId, OrderStatus, ProductId, UserId,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::Result;
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

const USER_COLUMNS: &str = "id, name, email, phone, address, created_at";

const PRODUCT_COLUMNS: &str = "id, name, description, category, price, unit, image_url, \
     is_available, stock_quantity, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, total_amount, status, delivery_address, \
     delivery_phone, notes, created_at, updated_at";

const ORDER_LINE_COLUMNS: &str =
    "id, order_id, product_id, quantity, unit_price, line_total, created_at";

const DELIVERY_COLUMNS: &str = "id, order_id, status, estimated_delivery_at, actual_delivery_at, \
     courier_name, courier_phone, tracking_notes, created_at, updated_at";

// Cart lines joined with products; product columns carry a `p_` prefix.
const CART_JOIN_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.product_id, c.quantity, c.created_at,
           p.id AS p_id, p.name AS p_name, p.description AS p_description,
           p.category AS p_category, p.price AS p_price, p.unit AS p_unit,
           p.image_url AS p_image_url, p.is_available AS p_is_available,
           p.stock_quantity AS p_stock_quantity, p.created_at AS p_created_at,
           p.updated_at AS p_updated_at
    FROM cart_items c
    JOIN products p ON p.id = c.product_id
    WHERE c.user_id = $1
    ORDER BY c.id ASC
"#;

/// Escapes `LIKE` metacharacters so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn row_to_user(row: PgRow) -> Result<UserRecord> {
    Ok(UserRecord {
        id: UserId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: &PgRow, prefix: &str) -> Result<ProductRecord> {
    let col = |name: &str| format!("{prefix}{name}");
    Ok(ProductRecord {
        id: ProductId::new(row.try_get(col("id").as_str())?),
        name: row.try_get(col("name").as_str())?,
        description: row.try_get(col("description").as_str())?,
        category: row.try_get(col("category").as_str())?,
        price: row.try_get(col("price").as_str())?,
        unit: row.try_get(col("unit").as_str())?,
        image_url: row.try_get(col("image_url").as_str())?,
        is_available: row.try_get(col("is_available").as_str())?,
        stock_quantity: row.try_get(col("stock_quantity").as_str())?,
        created_at: row.try_get(col("created_at").as_str())?,
        updated_at: row.try_get(col("updated_at").as_str())?,
    })
}

fn row_to_cart_line(row: &PgRow) -> Result<CartLineRecord> {
    Ok(CartLineRecord {
        id: CartLineId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_line_with_product(row: PgRow) -> Result<CartLineWithProduct> {
    Ok(CartLineWithProduct {
        line: row_to_cart_line(&row)?,
        product: row_to_product(&row, "p_")?,
    })
}

fn row_to_order(row: PgRow) -> Result<OrderRecord> {
    let status: String = row.try_get("status")?;
    Ok(OrderRecord {
        id: OrderId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        total_amount: row.try_get("total_amount")?,
        status: status.parse::<OrderStatus>()?,
        delivery_address: row.try_get("delivery_address")?,
        delivery_phone: row.try_get("delivery_phone")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_order_line(row: &PgRow) -> Result<OrderLineRecord> {
    Ok(OrderLineRecord {
        id: OrderLineId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        product_id: ProductId::new(row.try_get("product_id")?),
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        line_total: row.try_get("line_total")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_delivery(row: PgRow) -> Result<DeliveryRecord> {
    let status: String = row.try_get("status")?;
    Ok(DeliveryRecord {
        id: DeliveryId::new(row.try_get("id")?),
        order_id: OrderId::new(row.try_get("order_id")?),
        status: status.parse::<DeliveryStatus>()?,
        estimated_delivery_at: row.try_get("estimated_delivery_at")?,
        actual_delivery_at: row.try_get("actual_delivery_at")?,
        courier_name: row.try_get("courier_name")?,
        courier_phone: row.try_get("courier_phone")?,
        tracking_notes: row.try_get("tracking_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresStore {
    async fn insert_user(&self, user: NewUser) -> Result<UserRecord> {
        let row = sqlx::query(&format!(
            "INSERT INTO users (name, email, phone, address) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.address)
        .fetch_one(&self.pool)
        .await?;

        row_to_user(row)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_user).transpose()
    }
}

#[async_trait]
impl CatalogRepository for PostgresStore {
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductRecord>> {
        let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
        let mut param_count = 0;

        // Build dynamic query
        if filter.category.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND category = ${param_count}"));
        }
        if filter.search.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND (name ILIKE '%' || ${param_count} || '%' ESCAPE '\\' \
                 OR description ILIKE '%' || ${param_count} || '%' ESCAPE '\\')"
            ));
        }
        if filter.available_only {
            sql.push_str(" AND is_available");
        }
        sql.push_str(" ORDER BY name ASC, id ASC");

        let mut query = sqlx::query(&sql);
        if let Some(ref category) = filter.category {
            query = query.bind(category);
        }
        if let Some(ref search) = filter.search {
            query = query.bind(escape_like(search));
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(|row| row_to_product(row, "")).collect()
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(product_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_product(&row, "")).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<ProductRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products
                (name, description, category, price, unit, image_url, is_available, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price)
        .bind(&product.unit)
        .bind(&product.image_url)
        .bind(product.is_available)
        .bind(product.stock_quantity)
        .fetch_one(&self.pool)
        .await?;

        row_to_product(&row, "")
    }

    async fn update_product(
        &self,
        product_id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<ProductRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                price = COALESCE($2, price),
                is_available = COALESCE($3, is_available),
                stock_quantity = COALESCE($4, stock_quantity),
                updated_at = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product_id.as_i64())
        .bind(changes.price)
        .bind(changes.is_available)
        .bind(changes.stock_quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_product(&row, "")).transpose()
    }
}

#[async_trait]
impl CartRepository for PostgresStore {
    async fn list_lines(&self, user_id: UserId) -> Result<Vec<CartLineWithProduct>> {
        let rows = sqlx::query(CART_JOIN_SELECT)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(row_to_cart_line_with_product).collect()
    }

    async fn insert_line(&self, line: NewCartLine) -> Result<CartLineRecord> {
        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(line.user_id.as_i64())
        .bind(line.product_id.as_i64())
        .bind(line.quantity)
        .fetch_one(&self.pool)
        .await?;

        row_to_cart_line(&row)
    }

    async fn update_line_quantity(
        &self,
        line_id: CartLineId,
        quantity: i32,
    ) -> Result<Option<CartLineRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = $2
            WHERE id = $1
            RETURNING id, user_id, product_id, quantity, created_at
            "#,
        )
        .bind(line_id.as_i64())
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_cart_line).transpose()
    }

    async fn delete_line(&self, line_id: CartLineId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(line_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>> {
        let tx = self.pool.begin().await?;
        tracing::debug!("checkout transaction started");
        Ok(Box::new(PostgresCheckout { tx }))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(order_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_order).transpose()
    }

    async fn list_order_lines(&self, order_id: OrderId) -> Result<Vec<OrderLineWithProduct>> {
        let rows = sqlx::query(
            r#"
            SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price,
                   oi.line_total, oi.created_at,
                   p.name AS p_name, p.category AS p_category, p.unit AS p_unit,
                   p.image_url AS p_image_url
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
            "#,
        )
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let line = row_to_order_line(row)?;
                let product = ProductSummary {
                    id: line.product_id,
                    name: row.try_get("p_name")?,
                    category: row.try_get("p_category")?,
                    unit: row.try_get("p_unit")?,
                    image_url: row.try_get("p_image_url")?,
                };
                Ok(OrderLineWithProduct { line, product })
            })
            .collect()
    }

    async fn list_orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_order).collect()
    }

    async fn update_order_status(
        &self,
        order_id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(order_id.as_i64())
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_order).transpose()
    }
}

#[async_trait]
impl DeliveryRepository for PostgresStore {
    async fn insert_delivery(&self, delivery: NewDelivery) -> Result<DeliveryRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO deliveries
                (order_id, estimated_delivery_at, courier_name, courier_phone, tracking_notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DELIVERY_COLUMNS}
            "#
        ))
        .bind(delivery.order_id.as_i64())
        .bind(delivery.estimated_delivery_at)
        .bind(&delivery.courier_name)
        .bind(&delivery.courier_phone)
        .bind(&delivery.tracking_notes)
        .fetch_one(&self.pool)
        .await?;

        row_to_delivery(row)
    }

    async fn get_delivery(&self, delivery_id: DeliveryId) -> Result<Option<DeliveryRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1"
        ))
        .bind(delivery_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_delivery).transpose()
    }

    async fn first_delivery_for_order(&self, order_id: OrderId) -> Result<Option<DeliveryRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE order_id = $1 \
             ORDER BY id ASC LIMIT 1"
        ))
        .bind(order_id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_delivery).transpose()
    }

    async fn update_delivery(
        &self,
        delivery_id: DeliveryId,
        changes: DeliveryChanges,
    ) -> Result<Option<DeliveryRecord>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE deliveries SET
                status = COALESCE($2, status),
                estimated_delivery_at = COALESCE($3, estimated_delivery_at),
                actual_delivery_at = COALESCE($4, actual_delivery_at),
                courier_name = COALESCE($5, courier_name),
                courier_phone = COALESCE($6, courier_phone),
                tracking_notes = COALESCE($7, tracking_notes),
                updated_at = now()
            WHERE id = $1
            RETURNING {DELIVERY_COLUMNS}
            "#
        ))
        .bind(delivery_id.as_i64())
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.estimated_delivery_at)
        .bind(changes.actual_delivery_at)
        .bind(&changes.courier_name)
        .bind(&changes.courier_phone)
        .bind(&changes.tracking_notes)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_delivery).transpose()
    }
}

/// A checkout backed by a database transaction.
///
/// `sqlx` rolls the transaction back when it is dropped uncommitted.
struct PostgresCheckout {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutTransaction for PostgresCheckout {
    async fn user_exists(&mut self, user_id: UserId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id.as_i64())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(exists)
    }

    async fn lock_cart_lines(&mut self, user_id: UserId) -> Result<Vec<CartLineWithProduct>> {
        let sql = format!("{CART_JOIN_SELECT} FOR UPDATE OF c");
        let rows = sqlx::query(&sql)
            .bind(user_id.as_i64())
            .fetch_all(&mut *self.tx)
            .await?;
        tracing::debug!(%user_id, lines = rows.len(), "locked cart lines");

        rows.into_iter().map(row_to_cart_line_with_product).collect()
    }

    async fn insert_order(&mut self, order: NewOrder) -> Result<OrderRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (user_id, total_amount, status, delivery_address, delivery_phone, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.user_id.as_i64())
        .bind(order.total_amount)
        .bind(OrderStatus::Pending.as_str())
        .bind(&order.delivery_address)
        .bind(&order.delivery_phone)
        .bind(&order.notes)
        .fetch_one(&mut *self.tx)
        .await?;

        row_to_order(row)
    }

    #[tracing::instrument(level = "debug", skip(self, lines), fields(lines = lines.len()))]
    async fn insert_order_lines(
        &mut self,
        order_id: OrderId,
        lines: Vec<NewOrderLine>,
    ) -> Result<Vec<OrderLineRecord>> {
        let mut records = Vec::with_capacity(lines.len());
        for line in &lines {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING {ORDER_LINE_COLUMNS}
                "#
            ))
            .bind(order_id.as_i64())
            .bind(line.product_id.as_i64())
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.line_total)
            .fetch_one(&mut *self.tx)
            .await?;

            records.push(row_to_order_line(&row)?);
        }
        Ok(records)
    }

    async fn clear_cart(&mut self, user_id: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id.as_i64())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        tracing::debug!("checkout transaction committed");
        Ok(())
    }
}
