//! Delivery endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{DeliveryId, DeliveryStatus, OrderId};
use domain::{CreateDelivery, Delivery, DeliveryTracking, UpdateDelivery};
use serde::Deserialize;
use store::Store;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateDeliveryRequest {
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDeliveryRequest {
    pub status: Option<DeliveryStatus>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub tracking_notes: Option<String>,
}

// -- Handlers --

/// POST /orders/{id}/deliveries: schedule a delivery for an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<CreateDeliveryRequest>,
) -> Result<(StatusCode, Json<Delivery>), ApiError> {
    let cmd = CreateDelivery {
        order_id,
        estimated_delivery_at: req.estimated_delivery_at,
        courier_name: req.courier_name,
        courier_phone: req.courier_phone,
        tracking_notes: req.tracking_notes,
    };
    let delivery = state.deliveries.create_delivery(cmd).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

/// GET /orders/{id}/delivery: the order's delivery with progress.
#[tracing::instrument(skip(state))]
pub async fn tracking<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<DeliveryTracking>, ApiError> {
    Ok(Json(state.deliveries.tracking(order_id).await?))
}

/// PATCH /deliveries/{id}: courier details and status changes.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(delivery_id): ApiPath<DeliveryId>,
    ApiJson(req): ApiJson<UpdateDeliveryRequest>,
) -> Result<Json<Delivery>, ApiError> {
    let cmd = UpdateDelivery {
        status: req.status,
        estimated_delivery_at: req.estimated_delivery_at,
        actual_delivery_at: req.actual_delivery_at,
        courier_name: req.courier_name,
        courier_phone: req.courier_phone,
        tracking_notes: req.tracking_notes,
    };
    Ok(Json(state.deliveries.update_delivery(delivery_id, cmd).await?))
}
