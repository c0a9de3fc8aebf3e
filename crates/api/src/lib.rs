//! HTTP API server with observability for the grocery storefront.
//!
//! Provides REST endpoints for accounts, the catalog, carts, order placement
//! and deliveries, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<S>))
        .route("/users", post(routes::users::create::<S>))
        .route("/users/{id}", get(routes::users::get::<S>))
        .route(
            "/users/{id}/cart",
            get(routes::cart::list::<S>)
                .post(routes::cart::add::<S>)
                .delete(routes::cart::clear::<S>),
        )
        .route("/users/{id}/orders", get(routes::orders::list_for_user::<S>))
        .route(
            "/cart/{line_id}",
            patch(routes::cart::update_line::<S>).delete(routes::cart::remove_line::<S>),
        )
        .route(
            "/products",
            get(routes::catalog::list::<S>).post(routes::catalog::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::catalog::get::<S>).patch(routes::catalog::update::<S>),
        )
        .route("/categories", get(routes::catalog::categories::<S>))
        .route("/orders", post(routes::orders::place::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/status", patch(routes::orders::update_status::<S>))
        .route("/orders/{id}/deliveries", post(routes::deliveries::create::<S>))
        .route("/orders/{id}/delivery", get(routes::deliveries::tracking::<S>))
        .route("/deliveries/{id}", patch(routes::deliveries::update::<S>))
        .fallback(routes::ops::not_found)
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with every service sharing one store.
pub fn create_default_state<S: Store>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState::new(store))
}
