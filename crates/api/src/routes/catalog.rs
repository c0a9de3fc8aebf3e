//! Catalog endpoints. Reads never modify state.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::ProductId;
use domain::{CreateProduct, UpdateProduct};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use store::{ProductFilter, ProductRecord, Store};

use super::AppState;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default)]
    pub available: bool,
}

impl From<ListProductsQuery> for ProductFilter {
    fn from(query: ListProductsQuery) -> Self {
        ProductFilter {
            category: query.category,
            search: query.search,
            available_only: query.available,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: Option<String>,
    pub image_url: Option<String>,
    pub is_available: Option<bool>,
    pub stock_quantity: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateProductRequest {
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub stock_quantity: Option<i32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRecord> for ProductResponse {
    fn from(product: ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            category: product.category,
            price: product.price,
            unit: product.unit,
            image_url: product.image_url,
            is_available: product.is_available,
            stock_quantity: product.stock_quantity,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// -- Handlers --

/// GET /products: list products, filtered by `category`, `search` and `available`.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.catalog.list_products(query.into()).await?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /products/{id}: load a product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(product_id): ApiPath<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.catalog.get_product(product_id).await?;
    Ok(Json(product.into()))
}

/// POST /products: add a product to the catalog.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let cmd = CreateProduct {
        name: req.name,
        description: req.description,
        category: req.category,
        price: req.price,
        unit: req.unit,
        image_url: req.image_url,
        is_available: req.is_available.unwrap_or(true),
        stock_quantity: req.stock_quantity.unwrap_or(0),
    };
    let product = state.catalog.create_product(cmd).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PATCH /products/{id}: change price, availability or stock.
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(product_id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let cmd = UpdateProduct {
        price: req.price,
        is_available: req.is_available,
        stock_quantity: req.stock_quantity,
    };
    let product = state.catalog.update_product(product_id, cmd).await?;
    Ok(Json(product.into()))
}

/// GET /categories: distinct category names.
#[tracing::instrument(skip(state))]
pub async fn categories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.catalog.list_categories().await?))
}
