//! Persistence layer: delimited files, PostgreSQL and SQLite.
//!
//! The three store traits describe the operations every backend offers.
//! [`Storage`] picks one backend at startup and dispatches to it for the
//! lifetime of the process; handlers never see which one is active.

pub mod codec;
pub mod csv_records;
pub mod csv_store;
pub mod sql_store;

use std::future::Future;

use chrono::{DateTime, Utc};

pub use csv_store::CsvStorage;
pub use sql_store::{Dialect, SqlStorage};

use crate::config::{CsvPaths, ServerConfig, StorageType};
use crate::domain::{
    Category, DropdownValue, Entry, EntryId, EntryPatch, Event, NewEntry, NewEvent,
};
use crate::error::ApiError;

/// Ordered, unique-by-value lists, one per [`Category`].
pub trait DropdownStore {
    /// Values of `category` in ascending `order_index` order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn list_values(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Vec<DropdownValue>, ApiError>> + Send;

    /// Appends `value` after the current maximum position. A value that is
    /// already present leaves the list unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn append_value(
        &self,
        category: Category,
        value: &str,
    ) -> impl Future<Output = Result<Vec<DropdownValue>, ApiError>> + Send;

    /// Removes `value` without renumbering the remaining values.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if `value` is absent, or
    /// [`ApiError::Internal`] on storage failure.
    fn remove_value(
        &self,
        category: Category,
        value: &str,
    ) -> impl Future<Output = Result<Vec<DropdownValue>, ApiError>> + Send;

    /// Assigns positions `0..n` following the order of `values`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn reorder_values(
        &self,
        category: Category,
        values: &[String],
    ) -> impl Future<Output = Result<Vec<DropdownValue>, ApiError>> + Send;
}

/// Editable dataset entries.
pub trait EntryStore {
    /// All entries, newest `when_input` first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn list_entries(&self) -> impl Future<Output = Result<Vec<Entry>, ApiError>> + Send;

    /// Stores `entry` under a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn create_entry(&self, entry: NewEntry)
    -> impl Future<Output = Result<Entry, ApiError>> + Send;

    /// Applies `patch` to the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no entry has this id, or
    /// [`ApiError::Internal`] on storage failure.
    fn update_entry(
        &self,
        id: &EntryId,
        patch: EntryPatch,
    ) -> impl Future<Output = Result<Entry, ApiError>> + Send;

    /// Deletes the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no entry has this id, or
    /// [`ApiError::Internal`] on storage failure.
    fn delete_entry(&self, id: &EntryId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Append-only event log.
pub trait EventStore {
    /// All events, newest `created_at` first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn list_events(&self) -> impl Future<Output = Result<Vec<Event>, ApiError>> + Send;

    /// Appends `event` stamped with `created_at` and returns it with its id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    fn create_event(
        &self,
        event: NewEvent,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Event, ApiError>> + Send;
}

/// The backend selected at startup.
#[derive(Debug)]
pub enum Storage {
    /// Delimited files under the data directory.
    Csv(CsvStorage),
    /// PostgreSQL or SQLite.
    Relational(SqlStorage),
}

impl Storage {
    /// Opens the backend named by `config.storage_type`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the data directory cannot be
    /// prepared, or the database cannot be reached or migrated.
    pub async fn open(config: &ServerConfig) -> Result<Self, ApiError> {
        let storage = match config.storage_type {
            StorageType::Csv => Self::Csv(CsvStorage::open(&config.data_dir).await?),
            StorageType::Postgres => Self::Relational(
                SqlStorage::connect_postgres(&config.postgres, config.database_max_connections)
                    .await?,
            ),
            StorageType::Sqlite => Self::Relational(
                SqlStorage::connect_sqlite(&config.sqlite_file, config.database_max_connections)
                    .await?,
            ),
        };
        tracing::info!(storage = %storage.storage_type(), "storage backend selected");
        Ok(storage)
    }

    /// Which backend is active.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        match self {
            Self::Csv(_) => StorageType::Csv,
            Self::Relational(sql) => match sql.dialect() {
                Dialect::Postgres => StorageType::Postgres,
                Dialect::Sqlite => StorageType::Sqlite,
            },
        }
    }

    /// File layout when the file backend is active.
    #[must_use]
    pub fn csv_paths(&self) -> Option<&CsvPaths> {
        match self {
            Self::Csv(csv) => Some(csv.paths()),
            Self::Relational(_) => None,
        }
    }

    /// Releases backend resources before shutdown.
    pub async fn close(&self) {
        if let Self::Relational(sql) = self {
            sql.close().await;
        }
    }
}

impl DropdownStore for Storage {
    async fn list_values(&self, category: Category) -> Result<Vec<DropdownValue>, ApiError> {
        match self {
            Self::Csv(s) => s.list_values(category).await,
            Self::Relational(s) => s.list_values(category).await,
        }
    }

    async fn append_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        match self {
            Self::Csv(s) => s.append_value(category, value).await,
            Self::Relational(s) => s.append_value(category, value).await,
        }
    }

    async fn remove_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        match self {
            Self::Csv(s) => s.remove_value(category, value).await,
            Self::Relational(s) => s.remove_value(category, value).await,
        }
    }

    async fn reorder_values(
        &self,
        category: Category,
        values: &[String],
    ) -> Result<Vec<DropdownValue>, ApiError> {
        match self {
            Self::Csv(s) => s.reorder_values(category, values).await,
            Self::Relational(s) => s.reorder_values(category, values).await,
        }
    }
}

impl EntryStore for Storage {
    async fn list_entries(&self) -> Result<Vec<Entry>, ApiError> {
        match self {
            Self::Csv(s) => s.list_entries().await,
            Self::Relational(s) => s.list_entries().await,
        }
    }

    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, ApiError> {
        match self {
            Self::Csv(s) => s.create_entry(entry).await,
            Self::Relational(s) => s.create_entry(entry).await,
        }
    }

    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, ApiError> {
        match self {
            Self::Csv(s) => s.update_entry(id, patch).await,
            Self::Relational(s) => s.update_entry(id, patch).await,
        }
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), ApiError> {
        match self {
            Self::Csv(s) => s.delete_entry(id).await,
            Self::Relational(s) => s.delete_entry(id).await,
        }
    }
}

impl EventStore for Storage {
    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        match self {
            Self::Csv(s) => s.list_events().await,
            Self::Relational(s) => s.list_events().await,
        }
    }

    async fn create_event(
        &self,
        event: NewEvent,
        created_at: DateTime<Utc>,
    ) -> Result<Event, ApiError> {
        match self {
            Self::Csv(s) => s.create_event(event, created_at).await,
            Self::Relational(s) => s.create_event(event, created_at).await,
        }
    }
}
