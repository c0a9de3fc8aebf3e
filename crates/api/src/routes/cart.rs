//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{CartLineId, ProductId, UserId};
use domain::{AddToCart, Cart};
use serde::{Deserialize, Serialize};
use store::{CartLineRecord, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

// -- Request types --

#[derive(Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateCartLineRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub id: CartLineId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl From<CartLineRecord> for CartLineResponse {
    fn from(line: CartLineRecord) -> Self {
        Self {
            id: line.id,
            user_id: line.user_id,
            product_id: line.product_id,
            quantity: line.quantity,
            created_at: line.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct ClearCartResponse {
    pub removed: u64,
}

// -- Handlers --

/// GET /users/{id}/cart: cart lines with product details and subtotal.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<Cart>, ApiError> {
    Ok(Json(state.carts.list_cart(user_id).await?))
}

/// POST /users/{id}/cart: add a line. Repeated adds create separate lines.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<UserId>,
    ApiJson(req): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartLineResponse>), ApiError> {
    let line = state
        .carts
        .add_to_cart(AddToCart::new(user_id, req.product_id, req.quantity))
        .await?;
    Ok((StatusCode::CREATED, Json(line.into())))
}

/// DELETE /users/{id}/cart: remove every line.
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<ClearCartResponse>, ApiError> {
    let removed = state.carts.clear_cart(user_id).await?;
    Ok(Json(ClearCartResponse { removed }))
}

/// PATCH /cart/{line_id}: change a line's quantity.
#[tracing::instrument(skip(state, req))]
pub async fn update_line<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(line_id): ApiPath<CartLineId>,
    ApiJson(req): ApiJson<UpdateCartLineRequest>,
) -> Result<Json<CartLineResponse>, ApiError> {
    let line = state.carts.update_cart_line(line_id, req.quantity).await?;
    Ok(Json(line.into()))
}

/// DELETE /cart/{line_id}: remove one line.
#[tracing::instrument(skip(state))]
pub async fn remove_line<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(line_id): ApiPath<CartLineId>,
) -> Result<StatusCode, ApiError> {
    state.carts.remove_cart_line(line_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
