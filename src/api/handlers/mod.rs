//! REST endpoint handlers organized by resource.

pub mod dropdowns;
pub mod entries;
pub mod events;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes the entry, dropdown and event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(entries::routes())
        .merge(dropdowns::routes())
        .merge(events::routes())
}
