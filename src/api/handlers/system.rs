//! System endpoints: documentation page and health check.

use std::fmt::Write as _;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Endpoints listed on the documentation page.
const ENDPOINTS: [(&str, &str); 12] = [
    ("GET /", "This API documentation"),
    ("GET /health", "Service health status"),
    ("GET /entries", "Retrieve all entries"),
    ("POST /entries", "Create a new entry"),
    ("PUT /entries/{id}", "Update an entry by id"),
    ("DELETE /entries/{id}", "Delete an entry by id"),
    ("GET /dropdowns", "Retrieve all dropdown lists"),
    ("POST /dropdowns/{key}", "Add a new dropdown value for a given key"),
    ("DELETE /dropdowns/{key}", "Remove a dropdown value for a given key"),
    ("PUT /dropdowns/{key}/reorder", "Reorder dropdown values for a given key"),
    ("POST /events", "Create a new event"),
    ("GET /events", "Retrieve all events"),
];

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    storage: String,
    timestamp: String,
    version: String,
}

/// `GET /` — HTML page listing the endpoints and the active storage.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "API documentation page",
    responses(
        (status = 200, description = "HTML documentation", content_type = "text/html", body = String),
    )
)]
pub async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let storage = state.service.storage();
    let mut page = String::from(
        "<html>\n<head><title>Entry Tracker API</title></head>\n<body>\n\
         <h1>Entry Tracker API</h1>\n<h2>Available Endpoints:</h2>\n<ul>\n",
    );
    for (route, description) in ENDPOINTS {
        let _ = writeln!(
            page,
            "<li><strong>{}</strong> - {description}</li>",
            escape_html(route)
        );
    }
    page.push_str("</ul>\n");
    let _ = writeln!(page, "<p>Storage backend: {}</p>", storage.storage_type());
    if let Some(paths) = storage.csv_paths() {
        page.push_str("<p>CSV file paths used:</p>\n<ul>\n");
        for (label, path) in [
            ("Data", &paths.data),
            ("Countries", &paths.countries),
            ("Exchanges", &paths.exchanges),
            ("Event Types", &paths.event_types),
            ("Events", &paths.events),
        ] {
            let _ = writeln!(
                page,
                "<li>{label}: {}</li>",
                escape_html(&path.display().to_string())
            );
        }
        page.push_str("</ul>\n");
    }
    page.push_str("</body>\n</html>\n");
    Html(page)
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, storage backend, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            storage: state.service.storage_type().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}
