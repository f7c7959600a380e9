//! # entry-tracker
//!
//! REST API for a dataset-entry tracking tool: market event entries,
//! controlled-vocabulary dropdown lists and an append-only event log.
//!
//! One of three storage backends is chosen at startup through
//! `STORAGE_TYPE`: delimited files under a data directory, PostgreSQL, or
//! SQLite. The HTTP surface is identical for all of them.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── TrackerService (service/)
//!     │
//!     ├── Storage router (persistence/)
//!     │     ├── CsvStorage  ── record codec ── data/*.csv
//!     │     └── SqlStorage  ── sqlx AnyPool ── PostgreSQL | SQLite
//!     │
//!     └── Domain types (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
