use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::pricing::PricingError;

/// Error types for order operations
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Order not found")]
    NotFound,

    #[error("Product not found: {0}")]
    ProductNotFound(i32),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Pricing failures keep their own taxonomy and status mapping
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            OrderError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            OrderError::NotFound => (StatusCode::NOT_FOUND, "Order not found".to_string()),
            OrderError::ProductNotFound(id) => (
                StatusCode::BAD_REQUEST,
                format!("Product with id {} not found", id),
            ),
            OrderError::InvalidQuantity(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::InvalidTransition(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            OrderError::Pricing(err) => return err.into_response(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
