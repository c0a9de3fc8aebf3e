//! Product catalog: browsing and maintenance.

use common::ProductId;
use rust_decimal::Decimal;
use serde::Serialize;
use store::{
    CatalogRepository, NewProduct, ProductChanges, ProductFilter, ProductRecord, ProductSummary,
};

use crate::error::{DomainError, ValidationError, optional_text, require_text};
use crate::money::Money;

const DEFAULT_UNIT: &str = "each";

/// Largest unit price the catalog column holds (`NUMERIC(10, 2)`).
const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Descriptive product fields captured alongside a cart or order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub image_url: Option<String>,
}

impl From<&ProductRecord> for ProductSnapshot {
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

impl From<ProductSummary> for ProductSnapshot {
    fn from(summary: ProductSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            category: summary.category,
            unit: summary.unit,
            image_url: summary.image_url,
        }
    }
}

/// Command to add a product to the catalog.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub stock_quantity: i32,
}

impl CreateProduct {
    /// Creates a command for an available product with no stock recorded.
    pub fn new(name: impl Into<String>, category: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            description: None,
            category: category.into(),
            price,
            unit: None,
            image_url: None,
            is_available: true,
            stock_quantity: 0,
        }
    }

    /// Sets the stock quantity.
    pub fn with_stock(mut self, stock_quantity: i32) -> Self {
        self.stock_quantity = stock_quantity;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn validate(self) -> Result<NewProduct, ValidationError> {
        Ok(NewProduct {
            name: require_text("name", &self.name)?,
            description: optional_text(self.description.as_deref()),
            category: require_text("category", &self.category)?,
            price: validate_price(self.price)?,
            unit: optional_text(self.unit.as_deref()).unwrap_or_else(|| DEFAULT_UNIT.to_string()),
            image_url: optional_text(self.image_url.as_deref()),
            is_available: self.is_available,
            stock_quantity: validate_stock(self.stock_quantity)?,
        })
    }
}

/// Command to change a product's price, availability, or stock.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub stock_quantity: Option<i32>,
}

impl UpdateProduct {
    fn validate(self) -> Result<ProductChanges, ValidationError> {
        Ok(ProductChanges {
            price: self.price.map(validate_price).transpose()?,
            is_available: self.is_available,
            stock_quantity: self.stock_quantity.map(validate_stock).transpose()?,
        })
    }
}

fn validate_price(price: Decimal) -> Result<Decimal, ValidationError> {
    let money = Money::from_decimal(price).map_err(|source| ValidationError::InvalidAmount {
        field: "price",
        source,
    })?;
    if money.is_negative() {
        return Err(ValidationError::NegativeAmount { field: "price" });
    }
    if money.cents() > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price",
            value: money.dollars(),
        });
    }
    Ok(money.to_decimal())
}

fn validate_stock(stock_quantity: i32) -> Result<i32, ValidationError> {
    if stock_quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock_quantity",
            value: i64::from(stock_quantity),
        });
    }
    Ok(stock_quantity)
}

/// Service for browsing and maintaining the catalog.
///
/// Read operations have no side effects.
#[derive(Clone)]
pub struct CatalogService<S: CatalogRepository> {
    store: S,
}

impl<S: CatalogRepository> CatalogService<S> {
    /// Creates a new catalog service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists products matching the filter, ordered by name.
    ///
    /// Blank category or search terms are ignored.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<Vec<ProductRecord>, DomainError> {
        let filter = ProductFilter {
            category: optional_text(filter.category.as_deref()),
            search: optional_text(filter.search.as_deref()),
            available_only: filter.available_only,
        };
        Ok(self.store.list_products(&filter).await?)
    }

    /// Loads a product by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<ProductRecord, DomainError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", product_id))
    }

    /// Lists distinct category names.
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.store.list_categories().await?)
    }

    /// Adds a product to the catalog.
    #[tracing::instrument(skip(self), fields(name = %cmd.name))]
    pub async fn create_product(&self, cmd: CreateProduct) -> Result<ProductRecord, DomainError> {
        let product = cmd.validate()?;
        let record = self.store.insert_product(product).await?;
        tracing::info!(product_id = %record.id, "product created");
        Ok(record)
    }

    /// Updates a product's price, availability, or stock.
    ///
    /// Orders placed earlier keep the price they were placed at.
    #[tracing::instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        cmd: UpdateProduct,
    ) -> Result<ProductRecord, DomainError> {
        let changes = cmd.validate()?;
        self.store
            .update_product(product_id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", product_id))
    }
}
