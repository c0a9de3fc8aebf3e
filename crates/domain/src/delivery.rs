//! Deliveries and courier tracking.

use chrono::{DateTime, Utc};
use common::{DeliveryId, DeliveryStatus, OrderId};
use serde::Serialize;
use store::{DeliveryChanges, DeliveryRecord, DeliveryRepository, NewDelivery, OrderRepository};
use thiserror::Error;

use crate::error::{DomainError, optional_text};

/// Errors from delivery business rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Deliveries only move forward and stop at `delivered`.
    #[error("Invalid delivery transition: cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },
}

/// A delivery as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
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

impl From<DeliveryRecord> for Delivery {
    fn from(record: DeliveryRecord) -> Self {
        Self {
            id: record.id,
            order_id: record.order_id,
            status: record.status,
            estimated_delivery_at: record.estimated_delivery_at,
            actual_delivery_at: record.actual_delivery_at,
            courier_name: record.courier_name,
            courier_phone: record.courier_phone,
            tracking_notes: record.tracking_notes,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A delivery plus how far along it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryTracking {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub progress_percent: u8,
}

/// Command to schedule a delivery for an order.
#[derive(Debug, Clone)]
pub struct CreateDelivery {
    pub order_id: OrderId,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}

impl CreateDelivery {
    /// Creates a command with no courier assigned.
    pub fn for_order(order_id: OrderId) -> Self {
        Self {
            order_id,
            estimated_delivery_at: None,
            courier_name: None,
            courier_phone: None,
            tracking_notes: None,
        }
    }
}

/// Command to change a delivery. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct UpdateDelivery {
    pub status: Option<DeliveryStatus>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}

/// Service for scheduling and tracking deliveries.
#[derive(Clone)]
pub struct DeliveryService<S> {
    store: S,
}

impl<S> DeliveryService<S>
where
    S: DeliveryRepository + OrderRepository,
{
    /// Creates a new delivery service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Schedules a `pending` delivery for an existing order.
    ///
    /// An order may have more than one delivery.
    #[tracing::instrument(skip(self))]
    pub async fn create_delivery(&self, cmd: CreateDelivery) -> Result<Delivery, DomainError> {
        if self.store.get_order(cmd.order_id).await?.is_none() {
            return Err(DomainError::not_found("Order", cmd.order_id));
        }
        let record = self
            .store
            .insert_delivery(NewDelivery {
                order_id: cmd.order_id,
                estimated_delivery_at: cmd.estimated_delivery_at,
                courier_name: optional_text(cmd.courier_name.as_deref()),
                courier_phone: optional_text(cmd.courier_phone.as_deref()),
                tracking_notes: optional_text(cmd.tracking_notes.as_deref()),
            })
            .await?;
        tracing::info!(delivery_id = %record.id, "delivery scheduled");
        Ok(record.into())
    }

    /// Returns the earliest delivery created for the order.
    #[tracing::instrument(skip(self))]
    pub async fn get_delivery_for_order(&self, order_id: OrderId) -> Result<Delivery, DomainError> {
        self.store
            .first_delivery_for_order(order_id)
            .await?
            .map(Delivery::from)
            .ok_or_else(|| DomainError::not_found("Delivery for order", order_id))
    }

    /// Applies courier updates and status changes.
    ///
    /// Entering `delivered` records the delivery time unless one is given.
    #[tracing::instrument(skip(self))]
    pub async fn update_delivery(
        &self,
        delivery_id: DeliveryId,
        cmd: UpdateDelivery,
    ) -> Result<Delivery, DomainError> {
        let current = self
            .store
            .get_delivery(delivery_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Delivery", delivery_id))?;

        let mut actual_delivery_at = cmd.actual_delivery_at;
        if let Some(next) = cmd.status
            && next != current.status
        {
            if !current.status.can_transition_to(next) {
                return Err(DeliveryError::InvalidStatusTransition {
                    from: current.status,
                    to: next,
                }
                .into());
            }
            if next == DeliveryStatus::Delivered
                && actual_delivery_at.is_none()
                && current.actual_delivery_at.is_none()
            {
                actual_delivery_at = Some(Utc::now());
            }
        }

        let changes = DeliveryChanges {
            status: cmd.status,
            estimated_delivery_at: cmd.estimated_delivery_at,
            actual_delivery_at,
            courier_name: optional_text(cmd.courier_name.as_deref()),
            courier_phone: optional_text(cmd.courier_phone.as_deref()),
            tracking_notes: optional_text(cmd.tracking_notes.as_deref()),
        };
        let updated = self
            .store
            .update_delivery(delivery_id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("Delivery", delivery_id))?;
        Ok(updated.into())
    }

    /// Returns the order's delivery with its progress percentage.
    #[tracing::instrument(skip(self))]
    pub async fn tracking(&self, order_id: OrderId) -> Result<DeliveryTracking, DomainError> {
        let delivery = self.get_delivery_for_order(order_id).await?;
        Ok(DeliveryTracking {
            progress_percent: delivery.status.progress_percent(),
            delivery,
        })
    }
}
