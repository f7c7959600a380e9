//! Service layer: business logic orchestration.
//!
//! [`TrackerService`] validates client input, resolves dropdown keys to
//! categories, stamps new events, and delegates to the active
//! [`crate::persistence::Storage`] backend.

pub mod tracker_service;

pub use tracker_service::{DropdownLists, TrackerService};
