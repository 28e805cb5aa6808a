//! Custom error types for the common library
//!
//! This module defines the storage error type shared by every service.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Duplicate value for field {field}")]
    UniqueViolation {
        /// Name of the field that collided
        field: String,
    },
}

impl DatabaseError {
    /// Classify a query error, lifting unique-constraint violations into
    /// [`DatabaseError::UniqueViolation`].
    ///
    /// `field` names the column guarded by the constraint the caller expects to hit.
    pub fn from_query(err: SqlxError, field: &str) -> Self {
        match &err {
            SqlxError::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::UniqueViolation {
                    field: field.to_string(),
                }
            }
            _ => DatabaseError::Query(err),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
