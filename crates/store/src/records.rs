//! Row types read from and written to the store.
//!
//! Prices are `NUMERIC(10,2)` columns and travel as [`Decimal`]; the domain
//! layer converts them to its own money type.

use chrono::{DateTime, Utc};
use common::{
    CartLineId, DeliveryId, DeliveryStatus, OrderId, OrderLineId, OrderStatus, ProductId, UserId,
};
use rust_decimal::Decimal;

/// A storefront account.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// A catalog product with its live price.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub stock_quantity: i32,
}

/// Partial product update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub stock_quantity: Option<i32>,
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    /// Only products currently flagged as available.
    pub available_only: bool,
}

impl ProductFilter {
    /// Returns true if the product passes this filter.
    pub fn matches(&self, product: &ProductRecord) -> bool {
        if let Some(ref category) = self.category
            && &product.category != category
        {
            return false;
        }
        if self.available_only && !product.is_available {
            return false;
        }
        if let Some(ref search) = self.search {
            let needle = search.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

/// Descriptive product fields copied next to order lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub image_url: Option<String>,
}

impl From<&ProductRecord> for ProductSummary {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category.clone(),
            unit: product.unit.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

/// One line of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRecord {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a cart line.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
}

/// A cart line joined with its product's current state.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineWithProduct {
    pub line: CartLineRecord,
    pub product: ProductRecord,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting an order. New orders always start `pending`.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
}

/// An immutable order line.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineRecord {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting an order line.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// An order line joined with the product's descriptive fields.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineWithProduct {
    pub line: OrderLineRecord,
    pub product: ProductSummary,
}

/// A delivery attached to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryRecord {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub status: DeliveryStatus,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a delivery. New deliveries always start `pending`.
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub order_id: OrderId,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}

/// Partial delivery update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeliveryChanges {
    pub status: Option<DeliveryStatus>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}
