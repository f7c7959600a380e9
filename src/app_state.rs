//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::TrackerService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Tracker service for all business logic.
    pub service: Arc<TrackerService>,
}

impl AppState {
    /// Wraps a service for sharing across handlers.
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
