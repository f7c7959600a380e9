//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Resource routes are mounted at the root. With the `swagger-ui` feature
//! the OpenAPI document is served at `/api-docs/openapi.json` and the
//! interactive UI at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Entry Tracker API",
        description = "Market event entries, dropdown vocabularies and an event log."
    ),
    paths(
        handlers::system::index_handler,
        handlers::system::health_handler,
        handlers::entries::list_entries,
        handlers::entries::create_entry,
        handlers::entries::update_entry,
        handlers::entries::delete_entry,
        handlers::dropdowns::list_dropdowns,
        handlers::dropdowns::add_value,
        handlers::dropdowns::remove_value,
        handlers::dropdowns::reorder,
        handlers::events::list_events,
        handlers::events::create_event,
    ),
    components(schemas(crate::error::ErrorResponse)),
    tags(
        (name = "Entries", description = "Dataset entries"),
        (name = "Dropdowns", description = "Controlled-vocabulary lists"),
        (name = "Events", description = "Append-only event log"),
        (name = "System", description = "Documentation and health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::persistence::{CsvStorage, Storage};
    use crate::service::TrackerService;

    async fn make_app() -> (tempfile::TempDir, Router) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(csv) = CsvStorage::open(dir.path()).await else {
            panic!("open storage");
        };
        let state = AppState::new(TrackerService::new(Storage::Csv(csv)));
        (dir, build_router().with_state(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("request");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn entry_body() -> Value {
        json!({
            "date": "2024-05-01",
            "month": "May",
            "origin_country": "France",
            "main_impact_country": "Japan",
            "relevant_exchange": "TSE",
            "event_type": "Election",
            "who_input": "analyst",
            "when_input": "2024-05-01T10:00:00Z",
            "details": "snap election, markets closed"
        })
    }

    #[tokio::test]
    async fn bogus_dropdown_key_is_bad_request() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/dropdowns/bogus_key",
            Some(json!({"value": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid dropdown key"}));
    }

    #[tokio::test]
    async fn deleting_unknown_entry_is_not_found() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(&app, Method::DELETE, "/entries/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Entry not found"}));
    }

    #[tokio::test]
    async fn entry_lifecycle_over_http() {
        let (_dir, app) = make_app().await;
        let (status, created) = send(&app, Method::POST, "/entries", Some(entry_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        let Some(id) = created.get("id").and_then(Value::as_str) else {
            panic!("created entry has an id");
        };
        assert_eq!(created.get("details"), Some(&json!("snap election, markets closed")));

        let (status, listed) = send(&app, Method::GET, "/entries", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([created.clone()]));

        let uri = format!("/entries/{id}");
        let (status, updated) = send(&app, Method::PUT, &uri, Some(json!({"month": "June"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated.get("id"), Some(&json!(id)));
        assert_eq!(updated.get("month"), Some(&json!("June")));
        assert_eq!(updated.get("who_input"), Some(&json!("")));

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
    }

    #[tokio::test]
    async fn incomplete_entry_lists_missing_fields() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/entries",
            Some(json!({"date": "2024-05-01", "month": "May"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Missing required fields: origin_country, main_impact_country, relevant_exchange, event_type, who_input, when_input, details"})
        );
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (_dir, app) = make_app().await;
        let Ok(request) = Request::builder()
            .method(Method::POST)
            .uri("/entries")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
        else {
            panic!("request");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, Method::POST, "/events", Some(json!(42))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Invalid event data"}));
    }

    #[tokio::test]
    async fn dropdown_flow_over_http() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/dropdowns/origin_country",
            Some(json!({"value": "France"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"value": "France", "order_index": 0}]));

        let (_, body) = send(
            &app,
            Method::POST,
            "/dropdowns/origin_country",
            Some(json!({"value": "Japan"})),
        )
        .await;
        assert_eq!(
            body,
            json!([
                {"value": "France", "order_index": 0},
                {"value": "Japan", "order_index": 1}
            ])
        );

        let (status, body) = send(
            &app,
            Method::PUT,
            "/dropdowns/main_impact_country/reorder",
            Some(json!({"values": ["Japan", "France"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reordered = json!([
            {"value": "Japan", "order_index": 0},
            {"value": "France", "order_index": 1}
        ]);
        assert_eq!(body, reordered);

        let (_, lists) = send(&app, Method::GET, "/dropdowns", None).await;
        assert_eq!(lists.get("origin_country"), Some(&reordered));
        assert_eq!(lists.get("main_impact_country"), Some(&reordered));
        assert_eq!(lists.get("event_type"), Some(&json!([])));

        let (status, body) = send(
            &app,
            Method::DELETE,
            "/dropdowns/origin_country",
            Some(json!({"value": "Atlantis"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Value not found"}));
    }

    #[tokio::test]
    async fn dropdown_bodies_are_required() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(&app, Method::POST, "/dropdowns/event_type", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Value is required"}));

        let (status, body) = send(
            &app,
            Method::PUT,
            "/dropdowns/event_type/reorder",
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Values are required"}));
    }

    #[tokio::test]
    async fn events_are_created_with_ids() {
        let (_dir, app) = make_app().await;
        let event = json!({
            "event_name": "Rate decision",
            "event_type": "Policy",
            "origin_country": "Japan",
            "main_impact_country": "Japan",
            "relevant_exchange": "TSE",
            "month": "May",
            "year": "2024",
            "description": "BoJ holds rates"
        });
        let (status, created) = send(&app, Method::POST, "/events", Some(event)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.get("id"), Some(&json!(1)));
        assert!(created.get("created_at").is_some_and(Value::is_string));

        let (status, listed) = send(&app, Method::GET, "/events", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([created]));
    }

    #[tokio::test]
    async fn health_and_index_describe_storage() {
        let (_dir, app) = make_app().await;
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("storage"), Some(&json!("csv")));

        let Ok(request) = Request::builder().uri("/").body(Body::empty()) else {
            panic!("request");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body");
        };
        let page = String::from_utf8_lossy(&bytes);
        assert!(page.contains("PUT /dropdowns/{key}/reorder"));
        assert!(page.contains("countries.csv"));
    }

    #[test]
    fn openapi_document_lists_every_resource() {
        let doc = ApiDoc::openapi();
        for path in [
            "/",
            "/health",
            "/entries",
            "/entries/{id}",
            "/dropdowns",
            "/dropdowns/{key}",
            "/dropdowns/{key}/reorder",
            "/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
