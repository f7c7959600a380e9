//! Data Transfer Objects for REST request/response serialization.
//!
//! Entry and event bodies deserialize straight into the domain types
//! [`crate::domain::EntryPatch`] and [`crate::domain::EventDraft`]; this
//! module holds the remaining wire-only shapes.

pub mod common_dto;
pub mod dropdown_dto;

pub use common_dto::*;
pub use dropdown_dto::*;
