//! Delimited-file storage backend.
//!
//! Each category, the entries and the events live in their own file under
//! the data directory. Every mutation is a full read followed by a full
//! rewrite of one file, performed while holding `write_lock`, so writers
//! within this process never interleave. Several processes sharing one
//! data directory are not supported.

use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::codec::{read_records, write_records};
use super::csv_records::{from_records, to_records};
use super::{DropdownStore, EntryStore, EventStore};
use crate::config::CsvPaths;
use crate::domain::dropdown::{next_order_index, positioned};
use crate::domain::{
    Category, DropdownValue, Entry, EntryId, EntryIdGenerator, EntryPatch, Event, NewEntry,
    NewEvent,
};
use crate::error::ApiError;

/// File-backed implementation of every store.
#[derive(Debug)]
pub struct CsvStorage {
    paths: CsvPaths,
    ids: EntryIdGenerator,
    write_lock: Mutex<()>,
}

impl CsvStorage {
    /// Opens the backend rooted at `data_dir`, creating the directory and
    /// any missing file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the directory or a file cannot be
    /// created.
    pub async fn open(data_dir: &Path) -> Result<Self, ApiError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let storage = Self {
            paths: CsvPaths::in_dir(data_dir),
            ids: EntryIdGenerator::new(),
            write_lock: Mutex::new(()),
        };
        for path in [
            &storage.paths.data,
            &storage.paths.countries,
            &storage.paths.exchanges,
            &storage.paths.event_types,
            &storage.paths.events,
        ] {
            read_records(path).await?;
        }
        tracing::info!(dir = %data_dir.display(), "file storage ready");
        Ok(storage)
    }

    /// Files used by this backend.
    #[must_use]
    pub fn paths(&self) -> &CsvPaths {
        &self.paths
    }

    fn category_path(&self, category: Category) -> &Path {
        match category {
            Category::Countries => &self.paths.countries,
            Category::Exchanges => &self.paths.exchanges,
            Category::EventTypes => &self.paths.event_types,
        }
    }

    async fn read_values(&self, category: Category) -> Result<Vec<DropdownValue>, ApiError> {
        let records = read_records(self.category_path(category)).await?;
        let mut values: Vec<DropdownValue> = from_records(&records)?;
        values.sort_by_key(|v| v.order_index);
        Ok(values)
    }

    async fn write_values(
        &self,
        category: Category,
        values: &[DropdownValue],
    ) -> Result<(), ApiError> {
        write_records(self.category_path(category), &to_records(values)).await
    }

    async fn read_entries(&self) -> Result<Vec<Entry>, ApiError> {
        from_records(&read_records(&self.paths.data).await?)
    }

    async fn read_events(&self) -> Result<Vec<Event>, ApiError> {
        from_records(&read_records(&self.paths.events).await?)
    }
}

impl DropdownStore for CsvStorage {
    async fn list_values(&self, category: Category) -> Result<Vec<DropdownValue>, ApiError> {
        self.read_values(category).await
    }

    async fn append_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_values(category).await?;
        if values.iter().any(|v| v.value == value) {
            return Ok(values);
        }
        values.push(DropdownValue::new(value, next_order_index(&values)));
        self.write_values(category, &values).await?;
        Ok(values)
    }

    async fn remove_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_values(category).await?;
        let before = values.len();
        values.retain(|v| v.value != value);
        if values.len() == before {
            return Err(ApiError::value_not_found());
        }
        self.write_values(category, &values).await?;
        Ok(values)
    }

    /// Replaces the category with exactly `values`; omitted values are
    /// deleted.
    async fn reorder_values(
        &self,
        category: Category,
        values: &[String],
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let _guard = self.write_lock.lock().await;
        let reordered = positioned(values);
        self.write_values(category, &reordered).await?;
        Ok(reordered)
    }
}

impl EntryStore for CsvStorage {
    async fn list_entries(&self) -> Result<Vec<Entry>, ApiError> {
        let mut entries = self.read_entries().await?;
        entries.sort_by(|a, b| b.when_input.cmp(&a.when_input));
        Ok(entries)
    }

    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let entry = entry.with_id(self.ids.next_id());
        entries.push(entry.clone());
        write_records(&self.paths.data, &to_records(&entries)).await?;
        Ok(entry)
    }

    /// Overwrites the nine data fields of the row; the id is kept.
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let entry = entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(ApiError::entry_not_found)?;
        *entry = patch.into_overwrite().with_id(id.clone());
        let updated = entry.clone();
        write_records(&self.paths.data, &to_records(&entries)).await?;
        Ok(updated)
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        entries.retain(|e| &e.id != id);
        if entries.len() == before {
            return Err(ApiError::entry_not_found());
        }
        write_records(&self.paths.data, &to_records(&entries)).await
    }
}

impl EventStore for CsvStorage {
    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let mut events = self.read_events().await?;
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    /// Numbers the event as the current row count plus one.
    async fn create_event(
        &self,
        event: NewEvent,
        created_at: DateTime<Utc>,
    ) -> Result<Event, ApiError> {
        let _guard = self.write_lock.lock().await;
        let mut events = self.read_events().await?;
        let id = i64::try_from(events.len())
            .map_err(|_| ApiError::Internal("event log too large".to_string()))?
            .saturating_add(1);
        let event = event.into_event(id, created_at);
        events.push(event.clone());
        write_records(&self.paths.events, &to_records(&events)).await?;
        Ok(event)
    }
}
