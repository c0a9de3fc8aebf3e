//! Shopping carts.
//!
//! A cart is the set of a user's cart lines. Adding a product that is already
//! in the cart creates another line; lines are never merged.

use common::{CartLineId, ProductId, UserId};
use serde::Serialize;
use store::{CartLineRecord, CartRepository, CatalogRepository, NewCartLine, UserRepository};
use thiserror::Error;

use crate::error::{DomainError, positive_quantity};
use crate::money::Money;
use crate::pricing::{PricedLine, price_cart};

/// Errors from cart business rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The product is listed but not currently sold.
    #[error("Product {0} is not available")]
    ProductUnavailable(ProductId),
}

/// A user's cart priced at current catalog prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cart {
    pub user_id: UserId,
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
}

/// Command to put a product in a user's cart.
#[derive(Debug, Clone)]
pub struct AddToCart {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl AddToCart {
    pub fn new(user_id: UserId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
        }
    }
}

/// Service for editing carts.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S> CartService<S>
where
    S: CartRepository + CatalogRepository + UserRepository,
{
    /// Creates a new cart service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns the user's cart lines with product details and a subtotal.
    #[tracing::instrument(skip(self))]
    pub async fn list_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        self.require_user(user_id).await?;
        let entries = self.store.list_lines(user_id).await?;
        let priced = price_cart(&entries)?;
        Ok(Cart {
            user_id,
            lines: priced.lines,
            subtotal: priced.total,
        })
    }

    /// Adds a new line to the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, cmd: AddToCart) -> Result<CartLineRecord, DomainError> {
        let quantity = positive_quantity("quantity", cmd.quantity)?;
        self.require_user(cmd.user_id).await?;

        let product = self
            .store
            .get_product(cmd.product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", cmd.product_id))?;
        if !product.is_available {
            return Err(CartError::ProductUnavailable(product.id).into());
        }

        let line = self
            .store
            .insert_line(NewCartLine {
                user_id: cmd.user_id,
                product_id: cmd.product_id,
                quantity,
            })
            .await?;
        tracing::debug!(line_id = %line.id, "cart line added");
        Ok(line)
    }

    /// Changes a line's quantity.
    #[tracing::instrument(skip(self))]
    pub async fn update_cart_line(
        &self,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLineRecord, DomainError> {
        let quantity = positive_quantity("quantity", quantity)?;
        self.store
            .update_line_quantity(line_id, quantity)
            .await?
            .ok_or_else(|| DomainError::not_found("Cart line", line_id))
    }

    /// Removes one line.
    #[tracing::instrument(skip(self))]
    pub async fn remove_cart_line(&self, line_id: CartLineId) -> Result<(), DomainError> {
        if !self.store.delete_line(line_id).await? {
            return Err(DomainError::not_found("Cart line", line_id));
        }
        Ok(())
    }

    /// Empties the user's cart, returning how many lines were removed.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: UserId) -> Result<u64, DomainError> {
        self.require_user(user_id).await?;
        Ok(self.store.clear(user_id).await?)
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), DomainError> {
        match self.store.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found("User", user_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use store::{InMemoryStore, NewProduct, NewUser, ProductChanges, ProductRecord};

    use super::*;
    use crate::error::ValidationError;

    struct Fixture {
        service: CartService<InMemoryStore>,
        store: InMemoryStore,
        user_id: UserId,
        product: ProductRecord,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let user_id = store
            .insert_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap()
            .id;
        let product = store
            .insert_product(NewProduct {
                name: "Eggs".to_string(),
                description: None,
                category: "dairy".to_string(),
                price: Decimal::new(425, 2),
                unit: "dozen".to_string(),
                image_url: None,
                is_available: true,
                stock_quantity: 20,
            })
            .await
            .unwrap();
        Fixture {
            service: CartService::new(store.clone()),
            store,
            user_id,
            product,
        }
    }

    #[tokio::test]
    async fn repeated_adds_create_separate_lines() {
        let f = fixture().await;
        f.service
            .add_to_cart(AddToCart::new(f.user_id, f.product.id, 1))
            .await
            .unwrap();
        f.service
            .add_to_cart(AddToCart::new(f.user_id, f.product.id, 2))
            .await
            .unwrap();

        let cart = f.service.list_cart(f.user_id).await.unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.subtotal, Money::from_cents(1275));
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() {
        let f = fixture().await;
        let result = f
            .service
            .add_to_cart(AddToCart::new(f.user_id, f.product.id, 0))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::NotPositive { .. }))
        ));
    }

    #[tokio::test]
    async fn unavailable_product_is_rejected() {
        let f = fixture().await;
        f.store
            .update_product(
                f.product.id,
                ProductChanges {
                    is_available: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = f
            .service
            .add_to_cart(AddToCart::new(f.user_id, f.product.id, 1))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Cart(CartError::ProductUnavailable(_)))
        ));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let f = fixture().await;
        let result = f
            .service
            .add_to_cart(AddToCart::new(f.user_id, ProductId::new(999), 1))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::NotFound {
                entity: "Product",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn update_and_remove_lines() {
        let f = fixture().await;
        let line = f
            .service
            .add_to_cart(AddToCart::new(f.user_id, f.product.id, 1))
            .await
            .unwrap();

        let updated = f.service.update_cart_line(line.id, 4).await.unwrap();
        assert_eq!(updated.quantity, 4);

        f.service.remove_cart_line(line.id).await.unwrap();
        assert!(matches!(
            f.service.remove_cart_line(line.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn clear_reports_removed_lines() {
        let f = fixture().await;
        for _ in 0..3 {
            f.service
                .add_to_cart(AddToCart::new(f.user_id, f.product.id, 1))
                .await
                .unwrap();
        }

        assert_eq!(f.service.clear_cart(f.user_id).await.unwrap(), 3);
        assert!(f.service.list_cart(f.user_id).await.unwrap().lines.is_empty());
    }
}
