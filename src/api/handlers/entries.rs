//! Entry CRUD handlers: list, create, update, delete.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::SuccessResponse;
use crate::app_state::AppState;
use crate::domain::{Entry, EntryId, EntryPatch};
use crate::error::{ApiError, ErrorResponse};

/// `GET /entries` — List every entry, newest first.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] on storage failure.
#[utoipa::path(
    get,
    path = "/entries",
    tag = "Entries",
    summary = "List entries",
    description = "Returns all entries sorted by `when_input`, newest first.",
    responses(
        (status = 200, description = "All entries", body = Vec<Entry>),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_entries(State(state): State<AppState>) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(state.service.list_entries().await?))
}

/// `POST /entries` — Create an entry.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] on a malformed body or missing field.
#[utoipa::path(
    post,
    path = "/entries",
    tag = "Entries",
    summary = "Create an entry",
    description = "Stores a new entry under a generated id. Every field is required.",
    request_body = EntryPatch,
    responses(
        (status = 201, description = "Entry created", body = Entry),
        (status = 400, description = "Invalid or incomplete entry", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn create_entry(
    State(state): State<AppState>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = body.map_err(|_| invalid_entry())?;
    let entry = state.service.create_entry(patch).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `PUT /entries/{id}` — Update an entry.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] on a malformed body or
/// [`ApiError::NotFound`] for an unknown id.
#[utoipa::path(
    put,
    path = "/entries/{id}",
    tag = "Entries",
    summary = "Update an entry",
    description = "Overwrites all nine data fields; fields absent from the body become empty.",
    params(
        ("id" = String, Path, description = "Entry id"),
    ),
    request_body = EntryPatch,
    responses(
        (status = 200, description = "Updated entry", body = Entry),
        (status = 400, description = "Invalid entry data", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Entry>, ApiError> {
    let Json(patch) = body.map_err(|_| invalid_entry())?;
    let entry = state.service.update_entry(&EntryId::new(id), patch).await?;
    Ok(Json(entry))
}

/// `DELETE /entries/{id}` — Delete an entry.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    tag = "Entries",
    summary = "Delete an entry",
    params(
        ("id" = String, Path, description = "Entry id"),
    ),
    responses(
        (status = 200, description = "Entry deleted", body = SuccessResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse),
    )
)]
pub async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.service.delete_entry(&EntryId::new(id)).await?;
    Ok(Json(SuccessResponse::OK))
}

fn invalid_entry() -> ApiError {
    ApiError::Validation("Invalid entry data".to_string())
}

/// Entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/{id}", put(update_entry).delete(delete_entry))
}
