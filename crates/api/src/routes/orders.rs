//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{OrderId, OrderStatus, UserId};
use domain::{Order, PlaceOrder, UpdateOrderStatus};
use serde::Deserialize;
use store::Store;

use super::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

// -- Request types --

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// -- Handlers --

/// POST /orders: convert the owner's cart into a `pending` order.
#[tracing::instrument(skip(state, req), fields(owner_id = %req.owner_id))]
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<PlaceOrder>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state
        .orders
        .place_order(req)
        .await
        .map_err(ApiError::Checkout)?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id}: load an order with its lines.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get_order(order_id).await?))
}

/// GET /users/{id}/orders: a user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list_for_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.list_orders(user_id).await?))
}

/// PATCH /orders/{id}/status: move an order along its lifecycle.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orders
        .update_status(UpdateOrderStatus::new(order_id, req.status))
        .await?;
    Ok(Json(order))
}
