//! Cart-to-order conversion.

use store::{NewOrder, NewOrderLine, OrderRepository};

use crate::error::DomainError;
use crate::pricing::{PricedCart, price_cart};

use super::{Order, OrderError, OrderLine, PlaceOrder};

/// Converts the owner's cart into a `pending` order.
///
/// Every write happens inside one checkout transaction. Any error before the
/// commit drops the transaction, leaving the ledger and the cart untouched, so
/// the caller may retry the whole call.
pub async fn place_order<S>(store: &S, cmd: &PlaceOrder) -> Result<Order, DomainError>
where
    S: OrderRepository + ?Sized,
{
    let delivery = cmd.validate()?;
    let owner_id = cmd.owner_id;

    let mut tx = store.begin_checkout().await?;

    if !tx.user_exists(owner_id).await? {
        return Err(OrderError::UnknownOwner(owner_id).into());
    }

    let cart = tx.lock_cart_lines(owner_id).await?;
    if cart.is_empty() {
        return Err(OrderError::CartEmpty.into());
    }

    let PricedCart { lines, total } = price_cart(&cart)?;

    let order = tx
        .insert_order(NewOrder {
            user_id: owner_id,
            total_amount: total.to_decimal(),
            delivery_address: delivery.address,
            delivery_phone: delivery.phone,
            notes: delivery.notes,
        })
        .await?;

    let new_lines = lines
        .iter()
        .map(|line| NewOrderLine {
            product_id: line.product.id,
            quantity: line.quantity as i32,
            unit_price: line.unit_price.to_decimal(),
            line_total: line.line_total.to_decimal(),
        })
        .collect();
    let records = tx.insert_order_lines(order.id, new_lines).await?;

    let cleared = tx.clear_cart(owner_id).await?;
    tx.commit().await?;

    tracing::debug!(order_id = %order.id, cleared, "cart converted to order");

    let order_lines = records
        .into_iter()
        .zip(lines)
        .map(|(record, priced)| OrderLine::from_record(record, priced.product))
        .collect::<Result<Vec<_>, _>>()?;
    Order::assemble(order, order_lines)
}

#[cfg(test)]
mod tests {
    use common::{OrderStatus, UserId};
    use rust_decimal::Decimal;
    use store::{
        CartRepository, CatalogRepository, FaultPoint, InMemoryStore, NewCartLine, NewProduct,
        NewUser, ProductRecord, UserRepository,
    };

    use super::*;
    use crate::error::ValidationError;
    use crate::money::Money;

    async fn product(store: &InMemoryStore, name: &str, cents: i64) -> ProductRecord {
        store
            .insert_product(NewProduct {
                name: name.to_string(),
                description: None,
                category: "pantry".to_string(),
                price: Decimal::new(cents, 2),
                unit: "each".to_string(),
                image_url: None,
                is_available: true,
                stock_quantity: 10,
            })
            .await
            .unwrap()
    }

    async fn owner(store: &InMemoryStore) -> UserId {
        store
            .insert_user(NewUser {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
                address: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn add(store: &InMemoryStore, user_id: UserId, product: &ProductRecord, quantity: i32) {
        store
            .insert_line(NewCartLine {
                user_id,
                product_id: product.id,
                quantity,
            })
            .await
            .unwrap();
    }

    fn cmd(owner_id: UserId) -> PlaceOrder {
        PlaceOrder::new(owner_id, "12 Elm St", "555-0100")
    }

    #[tokio::test]
    async fn places_pending_order_and_drains_cart() {
        let store = InMemoryStore::new();
        let user = owner(&store).await;
        let rice = product(&store, "Rice", 1299).await;
        let oil = product(&store, "Olive Oil", 2499).await;
        add(&store, user, &rice, 2).await;
        add(&store, user, &oil, 1).await;

        let order = place_order(&store, &cmd(user)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount, Money::from_cents(5097));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].product.name, "Rice");
        assert_eq!(order.lines[0].line_total, Money::from_cents(2598));
        assert!(store.list_lines(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_happens_before_any_io() {
        let store = InMemoryStore::new();
        store.set_fault(FaultPoint::InsertOrder, true);

        let result = place_order(&store, &PlaceOrder::new(UserId::new(1), " ", "555")).await;

        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::MissingField { .. }))
        ));
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected() {
        let store = InMemoryStore::new();
        let result = place_order(&store, &cmd(UserId::new(99))).await;
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::UnknownOwner(_)))
        ));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let store = InMemoryStore::new();
        let user = owner(&store).await;

        let result = place_order(&store, &cmd(user)).await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::CartEmpty))
        ));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn failed_line_insert_rolls_back_everything() {
        let store = InMemoryStore::new();
        let user = owner(&store).await;
        let rice = product(&store, "Rice", 1299).await;
        add(&store, user, &rice, 2).await;
        store.set_fault(FaultPoint::InsertOrderLines, true);

        let result = place_order(&store, &cmd(user)).await;

        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.order_line_count().await, 0);
        assert_eq!(store.list_lines(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_cart_clear_rolls_back_order() {
        let store = InMemoryStore::new();
        let user = owner(&store).await;
        let rice = product(&store, "Rice", 1299).await;
        add(&store, user, &rice, 1).await;
        store.set_fault(FaultPoint::ClearCart, true);

        assert!(place_order(&store, &cmd(user)).await.is_err());
        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.list_lines(user).await.unwrap().len(), 1);

        store.set_fault(FaultPoint::ClearCart, false);
        let order = place_order(&store, &cmd(user)).await.unwrap();
        assert_eq!(order.total_amount, Money::from_cents(1299));
    }
}
