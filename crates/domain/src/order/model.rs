//! Materialized orders as returned to callers.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderLineId, OrderStatus, UserId};
use serde::Serialize;
use store::{OrderLineRecord, OrderLineWithProduct, OrderRecord, StoreError};

use crate::catalog::ProductSnapshot;
use crate::error::DomainError;
use crate::money::Money;

/// One immutable line of an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub product: ProductSnapshot,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLine {
    pub(crate) fn from_record(
        line: OrderLineRecord,
        product: ProductSnapshot,
    ) -> Result<Self, DomainError> {
        let quantity = u32::try_from(line.quantity).map_err(|_| {
            StoreError::Corrupt(format!(
                "order line {} has quantity {}",
                line.id, line.quantity
            ))
        })?;
        Ok(Self {
            id: line.id,
            product,
            quantity,
            unit_price: Money::try_from(line.unit_price)?,
            line_total: Money::try_from(line.line_total)?,
        })
    }
}

/// An order header together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub delivery_address: String,
    pub delivery_phone: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    pub(crate) fn from_records(
        order: OrderRecord,
        lines: Vec<OrderLineWithProduct>,
    ) -> Result<Self, DomainError> {
        let lines = lines
            .into_iter()
            .map(|entry| OrderLine::from_record(entry.line, entry.product.into()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::assemble(order, lines)
    }

    pub(crate) fn assemble(order: OrderRecord, lines: Vec<OrderLine>) -> Result<Self, DomainError> {
        Ok(Self {
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total_amount: Money::try_from(order.total_amount)?,
            delivery_address: order.delivery_address,
            delivery_phone: order.delivery_phone,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
            lines,
        })
    }

    /// Sums the line totals.
    ///
    /// Always equals `total_amount` for orders written by checkout.
    pub fn lines_total(&self) -> Option<Money> {
        self.lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.line_total))
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}
