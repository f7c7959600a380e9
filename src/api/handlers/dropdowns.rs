//! Dropdown handlers: read all lists, add, remove, reorder.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{DropdownValueRequest, ReorderRequest};
use crate::app_state::AppState;
use crate::domain::DropdownValue;
use crate::error::{ApiError, ErrorResponse};
use crate::service::DropdownLists;

/// `GET /dropdowns` — Every dropdown list keyed by form field.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] on storage failure.
#[utoipa::path(
    get,
    path = "/dropdowns",
    tag = "Dropdowns",
    summary = "List all dropdowns",
    description = "Returns the values of each dropdown in display order. Both country keys share one list.",
    responses(
        (status = 200, description = "Dropdown lists", body = DropdownLists),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn list_dropdowns(State(state): State<AppState>) -> Result<Json<DropdownLists>, ApiError> {
    Ok(Json(state.service.dropdowns().await?))
}

/// `POST /dropdowns/{key}` — Add a value.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a missing value or unknown key.
#[utoipa::path(
    post,
    path = "/dropdowns/{key}",
    tag = "Dropdowns",
    summary = "Add a dropdown value",
    description = "Appends the value after the current last one. Adding an existing value changes nothing.",
    params(
        ("key" = String, Path, description = "One of origin_country, main_impact_country, relevant_exchange, event_type"),
    ),
    request_body = DropdownValueRequest,
    responses(
        (status = 200, description = "Updated list", body = Vec<DropdownValue>),
        (status = 400, description = "Missing value or invalid key", body = ErrorResponse),
    )
)]
pub async fn add_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<DropdownValueRequest>, JsonRejection>,
) -> Result<Json<Vec<DropdownValue>>, ApiError> {
    let value = required_value(body)?;
    Ok(Json(state.service.add_dropdown_value(&key, &value).await?))
}

/// `DELETE /dropdowns/{key}` — Remove a value.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a missing value or unknown key,
/// or [`ApiError::NotFound`] if the value is absent.
#[utoipa::path(
    delete,
    path = "/dropdowns/{key}",
    tag = "Dropdowns",
    summary = "Remove a dropdown value",
    params(
        ("key" = String, Path, description = "Dropdown key"),
    ),
    request_body = DropdownValueRequest,
    responses(
        (status = 200, description = "Updated list", body = Vec<DropdownValue>),
        (status = 400, description = "Missing value or invalid key", body = ErrorResponse),
        (status = 404, description = "Value not found", body = ErrorResponse),
    )
)]
pub async fn remove_value(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<DropdownValueRequest>, JsonRejection>,
) -> Result<Json<Vec<DropdownValue>>, ApiError> {
    let value = required_value(body)?;
    Ok(Json(state.service.remove_dropdown_value(&key, &value).await?))
}

/// `PUT /dropdowns/{key}/reorder` — Set the display order.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] for a missing list or unknown key.
#[utoipa::path(
    put,
    path = "/dropdowns/{key}/reorder",
    tag = "Dropdowns",
    summary = "Reorder a dropdown",
    description = "Positions each listed value by its index. The file backend drops values not listed; the database backends leave them in place.",
    params(
        ("key" = String, Path, description = "Dropdown key"),
    ),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Updated list", body = Vec<DropdownValue>),
        (status = 400, description = "Missing values or invalid key", body = ErrorResponse),
    )
)]
pub async fn reorder(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<DropdownValue>>, ApiError> {
    let values = body
        .ok()
        .and_then(|Json(req)| req.values)
        .ok_or_else(|| ApiError::Validation("Values are required".to_string()))?;
    Ok(Json(state.service.reorder_dropdown(&key, &values).await?))
}

fn required_value(body: Result<Json<DropdownValueRequest>, JsonRejection>) -> Result<String, ApiError> {
    body.ok()
        .and_then(|Json(req)| req.value)
        .ok_or_else(|| ApiError::Validation("Value is required".to_string()))
}

/// Dropdown routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dropdowns", get(list_dropdowns))
        .route("/dropdowns/{key}", post(add_value).delete(remove_value))
        .route("/dropdowns/{key}/reorder", put(reorder))
}
