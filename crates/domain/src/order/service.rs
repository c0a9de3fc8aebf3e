//! Order service providing the API for order operations.

use std::time::Instant;

use common::{OrderId, UserId};
use store::{OrderRepository, UserRepository};

use crate::error::DomainError;

use super::{Order, OrderError, PlaceOrder, UpdateOrderStatus, checkout};

/// Service for placing and managing orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderRepository + UserRepository,
{
    /// Creates a new order service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Converts the owner's cart into a `pending` order.
    ///
    /// Failures leave the cart and the ledger exactly as they were. The call is
    /// never retried here.
    #[tracing::instrument(skip(self, cmd), fields(owner_id = %cmd.owner_id))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let started = Instant::now();
        let result = checkout::place_order(&self.store, &cmd).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_id = %order.id,
                    total = %order.total_amount,
                    lines = order.lines.len(),
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total", "reason" => failure_reason(e))
                    .increment(1);
                tracing::warn!(error = %e, "checkout failed");
            }
        }
        result
    }

    /// Loads an order with its lines.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", order_id))?;
        let lines = self.store.list_order_lines(order_id).await?;
        Order::from_records(order, lines)
    }

    /// Lists a user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user_id: UserId) -> Result<Vec<Order>, DomainError> {
        if self.store.get_user(user_id).await?.is_none() {
            return Err(DomainError::not_found("User", user_id));
        }
        let records = self.store.list_orders_for_user(user_id).await?;
        let mut orders = Vec::with_capacity(records.len());
        for record in records {
            let lines = self.store.list_order_lines(record.id).await?;
            orders.push(Order::from_records(record, lines)?);
        }
        Ok(orders)
    }

    /// Moves an order along its lifecycle.
    ///
    /// Only the status and the update timestamp change; lines and totals are
    /// left as placed.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, cmd: UpdateOrderStatus) -> Result<Order, DomainError> {
        let current = self
            .store
            .get_order(cmd.order_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", cmd.order_id))?;

        if !current.status.can_transition_to(cmd.status) {
            return Err(OrderError::InvalidStatusTransition {
                from: current.status,
                to: cmd.status,
            }
            .into());
        }

        let updated = self
            .store
            .update_order_status(cmd.order_id, current.status, cmd.status)
            .await?
            .ok_or(OrderError::ConcurrentUpdate(cmd.order_id))?;
        tracing::info!(from = %current.status, to = %updated.status, "order status changed");

        let lines = self.store.list_order_lines(cmd.order_id).await?;
        Order::from_records(updated, lines)
    }
}

fn failure_reason(error: &DomainError) -> &'static str {
    match error {
        DomainError::Validation(_) => "validation",
        DomainError::Order(OrderError::CartEmpty) => "cart_empty",
        DomainError::Order(OrderError::UnknownOwner(_)) => "unknown_owner",
        DomainError::Order(_) => "pricing",
        DomainError::Store(_) => "store",
        DomainError::Cart(_)
        | DomainError::Delivery(_)
        | DomainError::NotFound { .. }
        | DomainError::Money(_) => "other",
    }
}
