//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CartError, DeliveryError, DomainError, OrderError};
use store::StoreError;

const INTERNAL_MESSAGE: &str = "internal server error";
const CHECKOUT_MESSAGE: &str = "order could not be placed, try again";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Error from order placement. Store faults get a retry hint.
    Checkout(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err, INTERNAL_MESSAGE),
            ApiError::Checkout(err) => domain_error_to_response(err, CHECKOUT_MESSAGE),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError, internal_message: &str) -> (StatusCode, String) {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
        return (status, internal_message.to_string());
    }
    (status, err.to_string())
}

fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Order(order_err) => match order_err {
            OrderError::CartEmpty | OrderError::UnknownOwner(_) | OrderError::AmountOverflow => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            OrderError::InvalidStatusTransition { .. } | OrderError::ConcurrentUpdate(_) => {
                StatusCode::CONFLICT
            }
        },
        DomainError::Cart(CartError::ProductUnavailable(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Delivery(DeliveryError::InvalidStatusTransition { .. }) => {
            StatusCode::CONFLICT
        }
        DomainError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        DomainError::Store(StoreError::ForeignKey(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Store(_) | DomainError::Money(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
