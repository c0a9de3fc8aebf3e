//! Order commands.

use common::{OrderId, OrderStatus, UserId};
use serde::{Deserialize, Deserializer};

use crate::error::{ValidationError, optional_text, require_text};

/// Command to turn a user's cart into an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    /// The user whose cart is checked out.
    pub owner_id: UserId,

    /// Where the order is delivered.
    #[serde(default, deserialize_with = "null_as_blank")]
    pub delivery_address: String,

    /// Phone number the courier calls.
    #[serde(default, deserialize_with = "null_as_blank")]
    pub delivery_phone: String,

    /// Free-form instructions.
    #[serde(default)]
    pub notes: Option<String>,
}

// Missing and null delivery fields fall through to `validate`, which names them.
fn null_as_blank<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl PlaceOrder {
    /// Creates a new PlaceOrder command without notes.
    pub fn new(
        owner_id: UserId,
        delivery_address: impl Into<String>,
        delivery_phone: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            delivery_address: delivery_address.into(),
            delivery_phone: delivery_phone.into(),
            notes: None,
        }
    }

    /// Adds delivery notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Trims the delivery fields and rejects blank ones.
    pub(crate) fn validate(&self) -> Result<ValidDelivery, ValidationError> {
        Ok(ValidDelivery {
            address: require_text("delivery_address", &self.delivery_address)?,
            phone: require_text("delivery_phone", &self.delivery_phone)?,
            notes: optional_text(self.notes.as_deref()),
        })
    }
}

/// Delivery fields that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidDelivery {
    pub address: String,
    pub phone: String,
    pub notes: Option<String>,
}

/// Command to move an order to a new status.
#[derive(Debug, Clone)]
pub struct UpdateOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl UpdateOrderStatus {
    /// Creates a new UpdateOrderStatus command.
    pub fn new(order_id: OrderId, status: OrderStatus) -> Self {
        Self { order_id, status }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_fields() {
        let cmd = PlaceOrder::new(UserId::new(1), "  12 Elm St ", " 555-0100\n").with_notes("  ");
        let valid = cmd.validate().unwrap();
        assert_eq!(valid.address, "12 Elm St");
        assert_eq!(valid.phone, "555-0100");
        assert_eq!(valid.notes, None);
    }

    #[test]
    fn blank_address_is_rejected() {
        let cmd = PlaceOrder::new(UserId::new(1), "   ", "555-0100");
        assert_eq!(
            cmd.validate().unwrap_err(),
            ValidationError::MissingField {
                field: "delivery_address"
            }
        );
    }

    #[test]
    fn blank_phone_is_rejected() {
        let cmd = PlaceOrder::new(UserId::new(1), "12 Elm St", "");
        assert_eq!(
            cmd.validate().unwrap_err(),
            ValidationError::MissingField {
                field: "delivery_phone"
            }
        );
    }

    #[test]
    fn deserializes_without_notes() {
        let cmd: PlaceOrder = serde_json::from_str(
            r#"{"owner_id": 7, "delivery_address": "12 Elm St", "delivery_phone": "555-0100"}"#,
        )
        .unwrap();
        assert_eq!(cmd.owner_id, UserId::new(7));
        assert!(cmd.notes.is_none());
    }

    #[test]
    fn missing_or_null_delivery_fields_fail_validation() {
        let missing: PlaceOrder =
            serde_json::from_str(r#"{"owner_id": 7, "delivery_address": "12 Elm St"}"#).unwrap();
        assert_eq!(
            missing.validate().unwrap_err(),
            ValidationError::MissingField {
                field: "delivery_phone"
            }
        );

        let null: PlaceOrder = serde_json::from_str(
            r#"{"owner_id": 7, "delivery_address": null, "delivery_phone": "555-0100"}"#,
        )
        .unwrap();
        assert_eq!(
            null.validate().unwrap_err(),
            ValidationError::MissingField {
                field: "delivery_address"
            }
        );
    }
}
