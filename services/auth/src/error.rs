//! Error types for the authentication service

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

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please provide name, email, and password")]
    MissingSignupFields,

    #[error("Please provide email and password")]
    MissingLoginFields,

    /// Input rejected by a field rule
    #[error("{0}")]
    Invalid(String),

    #[error("Email already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(DatabaseError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::UniqueViolation { .. } => AuthError::EmailTaken,
            other => AuthError::Database(other),
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingSignupFields
            | AuthError::MissingLoginFields
            | AuthError::Invalid(_)
            | AuthError::EmailTaken
            | AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                error!("Request failed: {}", self);
                "Server Error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
