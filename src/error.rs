// Error handling module for the lessons API
// Provides the top-level error type and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use crate::pricing::PricingError;

/// Main error type for handlers that sit outside a domain module
#[derive(Debug)]
pub enum ApiError {
    /// Validation errors from request validation
    ValidationError(validator::ValidationErrors),

    /// Resource not found by ID
    NotFound { resource: String, id: String },

    /// Pricing engine failures keep their own status mapping
    Pricing(PricingError),

    /// Database operation errors
    /// Sensitive details are filtered from client responses
    DatabaseError(sqlx::Error),
}

/// Consistent error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "NOT_FOUND")
    pub error_code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (e.g. field-level validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// ISO 8601 timestamp of when the error occurred
    pub timestamp: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::ValidationError(errors) => {
                debug!("Validation error: {:?}", errors);

                let body = ErrorResponse {
                    error_code: "VALIDATION_ERROR".to_string(),
                    message: "Request validation failed".to_string(),
                    details: Some(
                        serde_json::to_value(&errors).unwrap_or(serde_json::json!({})),
                    ),
                    timestamp: Utc::now().to_rfc3339(),
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotFound { resource, id } => {
                debug!("Resource not found: {} with id {}", resource, id);

                let body = ErrorResponse {
                    error_code: "NOT_FOUND".to_string(),
                    message: format!("{} with id {} not found", resource, id),
                    details: None,
                    timestamp: Utc::now().to_rfc3339(),
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            ApiError::Pricing(err) => err.into_response(),
            ApiError::DatabaseError(db_error) => {
                // Log the full error internally, return a generic message
                error!("Database error: {:?}", db_error);

                let body = ErrorResponse {
                    error_code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    details: None,
                    timestamp: Utc::now().to_rfc3339(),
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::DatabaseError(error)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

impl From<PricingError> for ApiError {
    fn from(error: PricingError) -> Self {
        ApiError::Pricing(error)
    }
}
