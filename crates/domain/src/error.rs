//! Domain error types.

use store::StoreError;
use thiserror::Error;

use crate::cart::CartError;
use crate::delivery::DeliveryError;
use crate::money::MoneyError;
use crate::order::OrderError;

/// Malformed input, rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is missing or blank.
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// A count that must be positive is not.
    #[error("{field} must be greater than 0 (got {value})")]
    NotPositive { field: &'static str, value: i64 },

    /// A count is negative or too large.
    #[error("{field} is out of range (got {value})")]
    OutOfRange { field: &'static str, value: i64 },

    /// A money amount is negative.
    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    /// A money amount can't be represented exactly.
    #[error("{field} is not a valid amount: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: MoneyError,
    },

    /// A field has the wrong shape.
    #[error("{field} is malformed: {reason}")]
    Malformed {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The request was malformed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// An order business rule rejected the request.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A cart business rule rejected the request.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// A delivery business rule rejected the request.
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Entity not found.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// A stored amount could not be read back as money.
    #[error("Invalid stored amount: {0}")]
    Money(#[from] MoneyError),

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl DomainError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        DomainError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Trims a required text field, rejecting blank values.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field, mapping blank values to None.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Converts a positive count into the database's integer type.
pub(crate) fn positive_quantity(field: &'static str, value: u32) -> Result<i32, ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive { field, value: 0 });
    }
    i32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        value: i64::from(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_trims() {
        assert_eq!(require_text("name", "  Kale ").unwrap(), "Kale");
    }

    #[test]
    fn require_text_rejects_whitespace() {
        assert_eq!(
            require_text("delivery_address", " \t\n"),
            Err(ValidationError::MissingField {
                field: "delivery_address"
            })
        );
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" ring bell ")), Some("ring bell".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn positive_quantity_bounds() {
        assert_eq!(positive_quantity("quantity", 3), Ok(3));
        assert!(matches!(
            positive_quantity("quantity", 0),
            Err(ValidationError::NotPositive { .. })
        ));
        assert!(matches!(
            positive_quantity("quantity", u32::MAX),
            Err(ValidationError::OutOfRange { .. })
        ));
    }
}
