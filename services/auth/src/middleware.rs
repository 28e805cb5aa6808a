//! Middleware for bearer token validation

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use common::jwt::{AuthUser, NO_TOKEN_MESSAGE};
use tracing::warn;

use crate::{error::AuthError, state::AppState};

/// Extract and validate the bearer token, exposing the caller as [`AuthUser`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(bearer) = req.headers().typed_get::<Authorization<Bearer>>() else {
        return Err(AuthError::Unauthorized(NO_TOKEN_MESSAGE));
    };

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Failed to validate token: {}", e);
            AuthError::Unauthorized(e.client_message())
        })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}
