//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::{jwt::AuthUser, users::NewUser};
use tracing::{info, warn};

use crate::{
    error::AuthError,
    middleware::auth_middleware,
    models::{AuthResponse, LoginRequest, SignupRequest, provided},
    password::{hash_password, verify_password},
    state::AppState,
    validation::{normalize_email, validate_email, validate_password},
};

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/users/me", get(current_user))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Register a new account and sign it in
pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<SignupRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    let (Some(name), Some(email), Some(password)) = (
        provided(&payload.name),
        provided(&payload.email),
        provided(&payload.password),
    ) else {
        return Err(AuthError::MissingSignupFields);
    };

    validate_password(password).map_err(AuthError::Invalid)?;
    let email = normalize_email(email);
    validate_email(&email).map_err(AuthError::Invalid)?;

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let user = state
        .users
        .create(NewUser {
            name: name.trim().to_string(),
            email,
            password_hash: hash_password(password)?,
        })
        .await?;
    info!("Registered user {}", user.id);

    let token = state.jwt_service.issue_token(user.id, &user.email)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    let (Some(email), Some(password)) = (provided(&payload.email), provided(&payload.password))
    else {
        return Err(AuthError::MissingLoginFields);
    };

    let email = normalize_email(email);
    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &user.password_hash)? {
        warn!("Login attempt with wrong password for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    let token = state.jwt_service.issue_token(user.id, &user.email)?;
    info!("User {} logged in", user.id);

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}

/// Profile of the caller
pub async fn current_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
) -> Result<impl IntoResponse, AuthError> {
    let user = state
        .users
        .find_by_id(caller.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(Json(user.profile()))
}
