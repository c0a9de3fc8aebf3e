//! Account endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::UserId;
use domain::CreateUser;
use serde::{Deserialize, Serialize};
use store::{Store, UserRecord};

use super::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

// -- Handlers --

/// POST /users: register a user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let cmd = CreateUser {
        name: req.name,
        email: req.email,
        phone: req.phone,
        address: req.address,
    };
    let user = state.users.create_user(cmd).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /users/{id}: load a user.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_user(user_id).await?;
    Ok(Json(user.into()))
}
