//! Authentication service request and response payloads

use common::users::UserProfile;
use serde::{Deserialize, Serialize};

/// Request for account creation
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Request for user login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Token and profile returned by signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

/// Borrow a field if it was supplied and is not blank
pub fn provided(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}
