//! Events service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use common::jwt::AuthUser;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth_middleware,
    models::{CreateEventRequest, UpdateEventRequest},
    notifications::templates,
    state::AppState,
};

/// Create the router for the events service
pub fn create_router(state: AppState) -> Router {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/events",
            get(list_events).merge(post(create_event).route_layer(require_auth.clone())),
        )
        .route(
            "/api/events/:event_id",
            get(get_event).merge(
                put(update_event)
                    .delete(delete_event)
                    .route_layer(require_auth.clone()),
            ),
        )
        .route(
            "/api/events/:event_id/book",
            post(book_event).route_layer(require_auth),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "events-service"
    }))
}

fn parse_event_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidIdFormat)
}

/// List all events
pub async fn list_events(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let events = state.events.list().await?;
    Ok(Json(events))
}

/// Create an event hosted by the caller
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateEventRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let date = payload.event_date()?;

    let host = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::HostNotFound)?;

    let event = payload.into_event(date, host.id, Utc::now())?;
    let event = state.events.insert(&event).await?;
    info!("Event {} created by {}", event.id, host.id);

    if !host.email.is_empty() {
        state
            .notifier
            .dispatch(templates::event_created(&host, &event));
    }

    Ok((StatusCode::CREATED, Json(event)))
}

/// Get a single event
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_event_id(&event_id)?;

    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    Ok(Json(event))
}

/// Update an event owned by the caller
pub async fn update_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateEventRequest>, ApiError>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_event_id(&event_id)?;

    let mut event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    if !event.is_hosted_by(user.id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to update this event",
        ));
    }

    if !payload.apply_to(&mut event)? {
        return Ok(Json(event));
    }

    event.updated_at = Utc::now();
    let event = state
        .events
        .update(&event)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    Ok(Json(event))
}

/// Delete an event owned by the caller
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_event_id(&event_id)?;

    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    if !event.is_hosted_by(user.id) {
        return Err(ApiError::Forbidden(
            "You are not authorized to delete this event",
        ));
    }

    if !state.events.delete(id).await? {
        return Err(ApiError::EventNotFound);
    }

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}

/// Book one ticket for the caller
pub async fn book_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_event_id(&event_id)?;

    let event = state
        .events
        .find_by_id(id)
        .await?
        .ok_or(ApiError::EventNotFound)?;

    if event.is_hosted_by(user.id) {
        return Err(ApiError::SelfBookingForbidden);
    }
    if event.is_sold_out() {
        return Err(ApiError::SoldOut);
    }

    let booker = state
        .users
        .find_by_id(user.id)
        .await?
        .ok_or(ApiError::BookerNotFound)?;

    let Some(event) = state.events.book(id, booker.id, Utc::now()).await? else {
        // Lost the race for the last slot, or the event was deleted meanwhile
        return match state.events.find_by_id(id).await? {
            Some(_) => Err(ApiError::SoldOut),
            None => Err(ApiError::EventNotFound),
        };
    };
    info!("User {} booked event {}", booker.id, event.id);

    if !booker.email.is_empty() {
        match state.events.count_booked_events(booker.id).await {
            Ok(total) => {
                state
                    .notifier
                    .dispatch(templates::booking_confirmed(&booker, &event, total));
            }
            Err(e) => error!(
                "Skipping booking confirmation for {}, failed to count bookings: {}",
                booker.id, e
            ),
        }
    }

    Ok(Json(event))
}
