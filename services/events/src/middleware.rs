//! Bearer token authentication middleware

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use common::jwt::{AuthUser, NO_TOKEN_MESSAGE};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Resolve the caller from the `Authorization: Bearer` header.
///
/// On success the [`AuthUser`] is inserted into the request extensions for
/// handlers to extract.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(ApiError::Unauthorized(NO_TOKEN_MESSAGE))?;

    let claims = state
        .jwt_service
        .validate_token(bearer.token())
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            ApiError::Unauthorized(e.client_message())
        })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}
