//! Custom error types for the events service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the events service
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(
        "Missing required event fields: title, date, time, location, description, category, capacity"
    )]
    MissingFields,

    #[error("Invalid date format. Please use YYYY-MM-DD.")]
    InvalidDate,

    #[error("Invalid event ID format")]
    InvalidIdFormat,

    #[error("Event not found")]
    EventNotFound,

    #[error("Host user not found.")]
    HostNotFound,

    #[error("Booking user not found.")]
    BookerNotFound,

    #[error("Hosts cannot book their own events.")]
    SelfBookingForbidden,

    #[error("Event is sold out. Capacity reached.")]
    SoldOut,

    /// Authenticated but not entitled
    #[error("{0}")]
    Forbidden(&'static str),

    /// Missing, malformed or expired bearer credential
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Persisted-state rule violations, reported together
    #[error("Validation Error: {}", .0.join(". "))]
    Validation(Vec<String>),

    /// Unreadable request body
    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields
            | ApiError::InvalidDate
            | ApiError::InvalidIdFormat
            | ApiError::SelfBookingForbidden
            | ApiError::SoldOut
            | ApiError::Validation(_)
            | ApiError::BadRequest(_)
            | ApiError::Database(DatabaseError::UniqueViolation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::EventNotFound | ApiError::HostNotFound | ApiError::BookerNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Database(DatabaseError::UniqueViolation { field }) => format!(
                "Duplicate field value entered for {}. Please use another value.",
                field
            ),
            ApiError::Database(_) | ApiError::Internal(_) => {
                error!("Request failed: {}", self);
                "Server Error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_business_rule_errors_are_bad_requests() {
        let (status, body) = body_of(ApiError::SoldOut).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Event is sold out. Capacity reached.");

        let (status, _) = body_of(ApiError::SelfBookingForbidden).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, body) = body_of(ApiError::Internal(anyhow::anyhow!("pool exploded"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Server Error");
    }

    #[tokio::test]
    async fn test_unique_violation_names_field() {
        let err = ApiError::Database(DatabaseError::UniqueViolation {
            field: "title".to_string(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "Duplicate field value entered for title. Please use another value."
        );
    }
}
