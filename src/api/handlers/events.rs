//! Event log handlers: list and append.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::domain::{Event, EventDraft};
use crate::error::{ApiError, ErrorResponse};

/// `GET /events` — List events, newest first.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] on storage failure.
#[utoipa::path(
    get,
    path = "/events",
    tag = "Events",
    summary = "List events",
    responses(
        (status = 200, description = "All events, newest first", body = Vec<Event>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.service.list_events().await?))
}

/// `POST /events` — Append an event.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] on a malformed body or missing field.
#[utoipa::path(
    post,
    path = "/events",
    tag = "Events",
    summary = "Create an event",
    description = "Appends an event; the server assigns `id` and `created_at`.",
    request_body = EventDraft,
    responses(
        (status = 201, description = "Event created", body = Event),
        (status = 400, description = "Invalid or incomplete event", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) =
        body.map_err(|_| ApiError::Validation("Invalid event data".to_string()))?;
    let event = state.service.create_event(draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events", get(list_events).post(create_event))
}
