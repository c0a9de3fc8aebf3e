//! Integration tests for order placement.
//!
//! These tests drive the public services against the in-memory store and
//! verify totals, price snapshots, cart draining and atomicity.

use common::{OrderStatus, UserId};
use domain::{
    AddToCart, CartService, CatalogService, CreateProduct, CreateUser, DomainError, Money,
    OrderError, OrderService, PlaceOrder, UpdateProduct, UserService,
};
use rust_decimal::Decimal;
use store::{FaultPoint, InMemoryStore, ProductFilter, ProductRecord};

struct Storefront {
    store: InMemoryStore,
    users: UserService<InMemoryStore>,
    catalog: CatalogService<InMemoryStore>,
    carts: CartService<InMemoryStore>,
    orders: OrderService<InMemoryStore>,
}

impl Storefront {
    fn new() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: UserService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            carts: CartService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    async fn user(&self, email: &str) -> UserId {
        self.users
            .create_user(CreateUser::new("Shopper", email))
            .await
            .unwrap()
            .id
    }

    async fn product(&self, name: &str, price: &str) -> ProductRecord {
        self.catalog
            .create_product(CreateProduct::new(name, "pantry", price.parse().unwrap()).with_stock(50))
            .await
            .unwrap()
    }

    async fn add(&self, user_id: UserId, product: &ProductRecord, quantity: u32) {
        self.carts
            .add_to_cart(AddToCart::new(user_id, product.id, quantity))
            .await
            .unwrap();
    }
}

fn checkout(owner_id: UserId) -> PlaceOrder {
    PlaceOrder::new(owner_id, "42 Market Lane", "555-0199")
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn two_products_total_fifty_ninety_seven() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        let cheese = shop.product("Parmesan", "24.99").await;
        shop.add(user, &pasta, 2).await;
        shop.add(user, &cheese, 1).await;

        let order = shop.orders.place_order(checkout(user)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_amount.to_decimal().to_string(), "50.97");
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].line_total, Money::from_cents(2598));
        assert_eq!(order.lines[1].line_total, Money::from_cents(2499));
        assert_eq!(order.lines_total(), Some(order.total_amount));
        assert_eq!(order.delivery_address, "42 Market Lane");
    }

    #[tokio::test]
    async fn cart_is_empty_after_placement() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        shop.add(user, &pasta, 1).await;
        shop.add(user, &pasta, 1).await;

        let order = shop.orders.place_order(checkout(user)).await.unwrap();

        assert_eq!(order.lines.len(), 2);
        assert!(shop.carts.list_cart(user).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn second_checkout_sees_empty_cart() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        shop.add(user, &pasta, 1).await;

        shop.orders.place_order(checkout(user)).await.unwrap();
        let result = shop.orders.place_order(checkout(user)).await;

        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::CartEmpty))
        ));
        assert_eq!(shop.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn concurrent_checkouts_place_one_order() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        shop.add(user, &pasta, 3).await;

        let first = shop.orders.clone();
        let second = shop.orders.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.place_order(checkout(user)).await }),
            tokio::spawn(async move { second.place_order(checkout(user)).await }),
        );
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(DomainError::Order(OrderError::CartEmpty))
        )));
        assert_eq!(shop.store.order_count().await, 1);
    }

    #[tokio::test]
    async fn orders_are_listed_newest_first() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;

        shop.add(user, &pasta, 1).await;
        let older = shop.orders.place_order(checkout(user)).await.unwrap();
        shop.add(user, &pasta, 2).await;
        let newer = shop.orders.place_order(checkout(user)).await.unwrap();

        let listed = shop.orders.list_orders(user).await.unwrap();
        assert_eq!(
            listed.iter().map(|o| o.id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
    }
}

mod snapshots {
    use super::*;

    #[tokio::test]
    async fn price_change_does_not_touch_placed_order() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        shop.add(user, &pasta, 2).await;
        let placed = shop.orders.place_order(checkout(user)).await.unwrap();

        shop.catalog
            .update_product(
                pasta.id,
                UpdateProduct {
                    price: Some(Decimal::new(1999, 2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reloaded = shop.orders.get_order(placed.id).await.unwrap();
        assert_eq!(reloaded.lines[0].unit_price, Money::from_cents(1299));
        assert_eq!(reloaded.total_amount, Money::from_cents(2598));
        assert_eq!(reloaded, placed);
    }
}

mod atomicity {
    use super::*;

    #[tokio::test]
    async fn line_insert_failure_leaves_no_trace() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        let cheese = shop.product("Parmesan", "24.99").await;
        shop.add(user, &pasta, 2).await;
        shop.add(user, &cheese, 1).await;
        let cart_before = shop.carts.list_cart(user).await.unwrap();

        shop.store.set_fault(FaultPoint::InsertOrderLines, true);
        let result = shop.orders.place_order(checkout(user)).await;

        assert!(matches!(result, Err(DomainError::Store(_))));
        assert_eq!(shop.store.order_count().await, 0);
        assert_eq!(shop.store.order_line_count().await, 0);
        assert!(shop.orders.list_orders(user).await.unwrap().is_empty());
        assert_eq!(shop.carts.list_cart(user).await.unwrap(), cart_before);
    }

    #[tokio::test]
    async fn retry_after_fault_succeeds() {
        let shop = Storefront::new();
        let user = shop.user("u1@example.com").await;
        let pasta = shop.product("Pasta", "12.99").await;
        shop.add(user, &pasta, 2).await;

        shop.store.set_fault(FaultPoint::InsertOrder, true);
        assert!(shop.orders.place_order(checkout(user)).await.is_err());

        shop.store.set_fault(FaultPoint::InsertOrder, false);
        let order = shop.orders.place_order(checkout(user)).await.unwrap();
        assert_eq!(order.total_amount, Money::from_cents(2598));
        assert_eq!(shop.store.order_count().await, 1);
    }
}

mod catalog_reads {
    use super::*;

    #[tokio::test]
    async fn listing_is_side_effect_free() {
        let shop = Storefront::new();
        shop.product("Pasta", "12.99").await;
        shop.product("Parmesan", "24.99").await;

        let filter = ProductFilter {
            search: Some("pa".to_string()),
            ..Default::default()
        };
        let first = shop.catalog.list_products(filter.clone()).await.unwrap();
        let second = shop.catalog.list_products(filter).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(shop.store.order_count().await, 0);
    }
}
