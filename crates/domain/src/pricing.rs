//! Line and total computation for carts and orders.
//!
//! All arithmetic is done in integer cents with overflow checks, so totals are
//! exact and independent of summation order.

use common::CartLineId;
use serde::Serialize;
use store::CartLineWithProduct;

use crate::catalog::ProductSnapshot;
use crate::error::{DomainError, ValidationError};
use crate::money::Money;
use crate::order::OrderError;

/// Largest line or order total the ledger columns hold (`NUMERIC(12, 2)`).
const MAX_AMOUNT_CENTS: i64 = 999_999_999_999;

fn within_ledger(amount: Money) -> Option<Money> {
    (amount.cents() <= MAX_AMOUNT_CENTS).then_some(amount)
}

/// A cart line with its price captured from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedLine {
    #[serde(rename = "id")]
    pub cart_line_id: CartLineId,
    pub product: ProductSnapshot,
    pub is_available: bool,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Priced lines in cart order plus their sum.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

impl PricedCart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Prices a single line: `unit_price × quantity`.
pub fn price_line(entry: &CartLineWithProduct) -> Result<PricedLine, DomainError> {
    let quantity = u32::try_from(entry.line.quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or(ValidationError::NotPositive {
            field: "quantity",
            value: i64::from(entry.line.quantity),
        })?;
    let unit_price = Money::from_decimal(entry.product.price)?;
    let line_total = unit_price
        .checked_multiply(quantity)
        .and_then(within_ledger)
        .ok_or(OrderError::AmountOverflow)?;

    Ok(PricedLine {
        cart_line_id: entry.line.id,
        product: ProductSnapshot::from(&entry.product),
        is_available: entry.product.is_available,
        quantity,
        unit_price,
        line_total,
    })
}

/// Prices every line and sums the line totals.
///
/// Lines for the same product are priced independently.
pub fn price_cart(entries: &[CartLineWithProduct]) -> Result<PricedCart, DomainError> {
    let mut lines = Vec::with_capacity(entries.len());
    let mut total = Money::zero();
    for entry in entries {
        let line = price_line(entry)?;
        total = total
            .checked_add(line.line_total)
            .and_then(within_ledger)
            .ok_or(OrderError::AmountOverflow)?;
        lines.push(line);
    }
    Ok(PricedCart { lines, total })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use common::{ProductId, UserId};
    use rust_decimal::Decimal;
    use store::{CartLineRecord, ProductRecord};

    use super::*;

    fn entry(line_id: i64, product_id: i64, price_cents: i64, quantity: i32) -> CartLineWithProduct {
        CartLineWithProduct {
            line: CartLineRecord {
                id: CartLineId::new(line_id),
                user_id: UserId::new(1),
                product_id: ProductId::new(product_id),
                quantity,
                created_at: Utc::now(),
            },
            product: ProductRecord {
                id: ProductId::new(product_id),
                name: format!("Product {product_id}"),
                description: None,
                category: "produce".to_string(),
                price: Decimal::new(price_cents, 2),
                unit: "each".to_string(),
                image_url: None,
                is_available: true,
                stock_quantity: 100,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    #[test]
    fn totals_are_exact() {
        let priced = price_cart(&[entry(1, 10, 1299, 2), entry(2, 11, 2499, 1)]).unwrap();

        assert_eq!(priced.lines[0].line_total, Money::from_cents(2598));
        assert_eq!(priced.lines[1].line_total, Money::from_cents(2499));
        assert_eq!(priced.total, Money::from_cents(5097));
        assert_eq!(priced.total.to_decimal().to_string(), "50.97");
    }

    #[test]
    fn tenths_do_not_drift() {
        // 0.10 added thirty times is exactly 3.00
        let entries: Vec<_> = (1..=30).map(|i| entry(i, i, 10, 1)).collect();
        let priced = price_cart(&entries).unwrap();
        assert_eq!(priced.total, Money::from_cents(300));
    }

    #[test]
    fn duplicate_products_stay_separate_lines() {
        let priced = price_cart(&[entry(1, 10, 500, 1), entry(2, 10, 500, 3)]).unwrap();
        assert_eq!(priced.lines.len(), 2);
        assert_eq!(priced.lines[1].quantity, 3);
        assert_eq!(priced.total, Money::from_cents(2000));
    }

    #[test]
    fn empty_cart_totals_zero() {
        let priced = price_cart(&[]).unwrap();
        assert!(priced.is_empty());
        assert_eq!(priced.total, Money::zero());
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let result = price_line(&entry(1, 10, 500, 0));
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::NotPositive { .. }))
        ));
    }

    #[test]
    fn overflow_is_reported() {
        let mut big = entry(1, 10, 0, i32::MAX);
        big.product.price = Decimal::new(i64::MAX / 100, 0);
        let result = price_line(&big);
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::AmountOverflow))
        ));
    }

    #[test]
    fn totals_beyond_ledger_precision_are_rejected() {
        // 99,999,999.99 x 11 needs thirteen integer digits
        let result = price_line(&entry(1, 10, 9_999_999_999, 11));
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::AmountOverflow))
        ));

        // each line fits, the sum does not
        let lines = [entry(1, 10, 9_999_999_999, 10), entry(2, 11, 9_999_999_999, 10)];
        let result = price_cart(&lines);
        assert!(matches!(
            result,
            Err(DomainError::Order(OrderError::AmountOverflow))
        ));
    }
}
