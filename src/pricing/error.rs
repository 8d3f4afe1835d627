// Error types for the lesson pricing engine
// Covers band resolution, fee composition and band assignment updates

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Main error type for pricing operations
///
/// Lookup failures are recoverable and reported to the caller; the engine
/// never converts a pricing failure into a zero price. The only silent
/// fallback in the whole engine is automatic-to-manual band resolution,
/// which is a success path, not an error conversion.
#[derive(Debug, Error)]
pub enum PricingError {
    /// No postcode entry matches the (normalized) postcode
    #[error("Postcode not found: {0}")]
    PostcodeNotFound(String),

    /// No price band matches the band code
    #[error("Price band not found: {0}")]
    BandNotFound(String),

    /// No course rule matches the course relation
    #[error("Course not found: {0}")]
    CourseNotFound(String),

    /// A price was requested before any band had been resolved
    #[error("No price band selected")]
    NoBandSelected,

    /// The band's offer table has no discounted rate for the course.
    /// Surfaced rather than defaulting the discount to zero, which would
    /// silently price the course at full rate as a "sale".
    #[error("Band {band} has no offer rate for course {course}")]
    UnknownDiscountRelation { band: String, course: String },

    /// A band row carries malformed reference data (e.g. offer-rate JSON)
    #[error("Invalid band configuration: {0}")]
    InvalidConfiguration(String),

    /// The data store could not be reached or failed mid-query.
    /// Retryable by the caller; retry policy is not owned by the engine.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            PricingError::PostcodeNotFound(_) => (StatusCode::NOT_FOUND, "Postcode not found"),
            PricingError::BandNotFound(_) => (StatusCode::NOT_FOUND, "Price band not found"),
            PricingError::CourseNotFound(_) => (StatusCode::NOT_FOUND, "Course not found"),
            PricingError::NoBandSelected => (StatusCode::BAD_REQUEST, "No price band selected"),
            PricingError::UnknownDiscountRelation { .. } => {
                tracing::error!("Offer table incomplete: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, "Offer table incomplete")
            }
            PricingError::InvalidConfiguration(ref msg) => {
                tracing::error!("Invalid band configuration: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid configuration")
            }
            PricingError::StoreUnavailable(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PricingError::PostcodeNotFound("AB1".to_string());
        assert_eq!(error.to_string(), "Postcode not found: AB1");

        let error = PricingError::UnknownDiscountRelation {
            band: "A".to_string(),
            course: "tenhour".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Band A has no offer rate for course tenhour"
        );

        let error = PricingError::NoBandSelected;
        assert_eq!(error.to_string(), "No price band selected");
    }

    #[test]
    fn test_error_from_sqlx() {
        let sqlx_error = sqlx::Error::PoolTimedOut;
        let error: PricingError = sqlx_error.into();
        assert!(matches!(error, PricingError::StoreUnavailable(_)));
    }
}
