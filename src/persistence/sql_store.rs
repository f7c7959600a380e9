//! Relational storage backend shared by PostgreSQL and SQLite.
//!
//! Both databases are driven through one `sqlx::AnyPool` and one query set;
//! they differ only in the connection URL and the embedded schema used at
//! startup. Timestamps are stored as RFC 3339 UTC text in the fixed format
//! of [`format_timestamp`], which sorts chronologically.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;

use super::{DropdownStore, EntryStore, EventStore};
use crate::config::PostgresSettings;
use crate::domain::dropdown::positioned;
use crate::domain::timestamp::{format_timestamp, parse_timestamp};
use crate::domain::{
    Category, DropdownValue, Entry, EntryId, EntryIdGenerator, EntryPatch, Event, NewEntry,
    NewEvent,
};
use crate::error::ApiError;

/// Row shape of `SELECT ... FROM entries`.
type EntryRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

/// Row shape of `SELECT ... FROM events`.
type EventRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    String,
);

const SELECT_ENTRIES: &str = "SELECT id, date, month, origin_country, main_impact_country, \
     relevant_exchange, event_type, who_input, when_input, details \
     FROM entries ORDER BY when_input DESC";

const INSERT_ENTRY: &str = "INSERT INTO entries (id, date, month, origin_country, \
     main_impact_country, relevant_exchange, event_type, who_input, when_input, details) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)";

const UPDATE_ENTRY: &str = "UPDATE entries SET date = $1, month = $2, origin_country = $3, \
     main_impact_country = $4, relevant_exchange = $5, event_type = $6, who_input = $7, \
     when_input = $8, details = $9 WHERE id = $10";

const DELETE_ENTRY: &str = "DELETE FROM entries WHERE id = $1";

const SELECT_EVENTS: &str = "SELECT id, event_name, event_type, origin_country, \
     main_impact_country, relevant_exchange, month, year, description, created_at \
     FROM events ORDER BY created_at DESC, id DESC";

const INSERT_EVENT: &str = "INSERT INTO events (event_name, event_type, origin_country, \
     main_impact_country, relevant_exchange, month, year, description, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id";

/// SQL dialect behind the pool; selects the embedded schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL server.
    Postgres,
    /// SQLite file.
    Sqlite,
}

/// `AnyPool`-backed implementation of every store.
#[derive(Debug)]
pub struct SqlStorage {
    pool: AnyPool,
    dialect: Dialect,
    ids: EntryIdGenerator,
}

impl SqlStorage {
    /// Connects to PostgreSQL and creates the schema if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the connection or the schema
    /// migration fails.
    pub async fn connect_postgres(
        settings: &PostgresSettings,
        max_connections: u32,
    ) -> Result<Self, ApiError> {
        tracing::info!(host = %settings.host, port = settings.port, database = %settings.database, "connecting to postgres");
        Self::connect(&settings.url(), Dialect::Postgres, max_connections).await
    }

    /// Opens (creating if needed) the SQLite database at `file` and creates
    /// the schema if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] if the file cannot be opened or the
    /// schema migration fails.
    pub async fn connect_sqlite(file: &Path, max_connections: u32) -> Result<Self, ApiError> {
        if let Some(parent) = file.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tracing::info!(file = %file.display(), "opening sqlite database");
        let url = format!("sqlite://{}?mode=rwc", file.display());
        Self::connect(&url, Dialect::Sqlite, max_connections).await
    }

    async fn connect(url: &str, dialect: Dialect, max_connections: u32) -> Result<Self, ApiError> {
        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await?;
        let storage = Self {
            pool,
            dialect,
            ids: EntryIdGenerator::new(),
        };
        storage.migrate().await?;
        Ok(storage)
    }

    async fn migrate(&self) -> Result<(), ApiError> {
        match self.dialect {
            Dialect::Postgres => sqlx::migrate!("./migrations/postgres").run(&self.pool).await?,
            Dialect::Sqlite => sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?,
        }
        tracing::info!(dialect = ?self.dialect, "database schema ready");
        Ok(())
    }

    /// The dialect this storage talks to.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn parse_stored(column: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(raw)
        .ok_or_else(|| ApiError::Internal(format!("malformed {column} timestamp: {raw}")))
}

fn entry_from_row(row: EntryRow) -> Result<Entry, ApiError> {
    let (
        id,
        date,
        month,
        origin_country,
        main_impact_country,
        relevant_exchange,
        event_type,
        who_input,
        when_input,
        details,
    ) = row;
    Ok(Entry {
        id: EntryId::new(id),
        date,
        month,
        origin_country,
        main_impact_country,
        relevant_exchange,
        event_type,
        who_input,
        when_input: parse_stored("when_input", &when_input)?,
        details,
    })
}

fn event_from_row(row: EventRow) -> Result<Event, ApiError> {
    let (
        id,
        event_name,
        event_type,
        origin_country,
        main_impact_country,
        relevant_exchange,
        month,
        year,
        description,
        created_at,
    ) = row;
    Ok(Event {
        id,
        event_name,
        event_type,
        origin_country,
        main_impact_country,
        relevant_exchange,
        month,
        year,
        description,
        created_at: parse_stored("created_at", &created_at)?,
    })
}

impl DropdownStore for SqlStorage {
    async fn list_values(&self, category: Category) -> Result<Vec<DropdownValue>, ApiError> {
        let sql = format!(
            "SELECT value, order_index FROM {category} ORDER BY order_index ASC, value ASC"
        );
        let rows = sqlx::query_as::<_, (String, i64)>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(value, order_index)| DropdownValue { value, order_index })
            .collect())
    }

    async fn append_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let exists_sql = format!("SELECT COUNT(*) FROM {category} WHERE value = $1");
        let existing: i64 = sqlx::query_scalar(&exists_sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;

        if existing == 0 {
            let max_sql = format!("SELECT COALESCE(MAX(order_index), -1) FROM {category}");
            let max: i64 = sqlx::query_scalar(&max_sql).fetch_one(&self.pool).await?;
            let insert_sql = format!(
                "INSERT INTO {category} (value, order_index) VALUES ($1, $2) \
                 ON CONFLICT (value) DO NOTHING"
            );
            sqlx::query(&insert_sql)
                .bind(value)
                .bind(max.saturating_add(1))
                .execute(&self.pool)
                .await?;
        }

        self.list_values(category).await
    }

    async fn remove_value(
        &self,
        category: Category,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let sql = format!("DELETE FROM {category} WHERE value = $1");
        let result = sqlx::query(&sql).bind(value).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::value_not_found());
        }
        self.list_values(category).await
    }

    /// Updates the position of each listed value inside one transaction.
    /// Rows not listed keep their current position; listed values with no
    /// row are ignored. A repeated value keeps its first position.
    async fn reorder_values(
        &self,
        category: Category,
        values: &[String],
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let sql = format!("UPDATE {category} SET order_index = $1 WHERE value = $2");
        let mut tx = self.pool.begin().await?;
        for position in positioned(values) {
            sqlx::query(&sql)
                .bind(position.order_index)
                .bind(position.value.as_str())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        self.list_values(category).await
    }
}

impl EntryStore for SqlStorage {
    async fn list_entries(&self) -> Result<Vec<Entry>, ApiError> {
        let rows = sqlx::query_as::<_, EntryRow>(SELECT_ENTRIES)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(entry_from_row).collect()
    }

    async fn create_entry(&self, entry: NewEntry) -> Result<Entry, ApiError> {
        let entry = entry.with_id(self.ids.next_id());
        sqlx::query(INSERT_ENTRY)
            .bind(entry.id.as_str())
            .bind(entry.date.as_str())
            .bind(entry.month.as_str())
            .bind(entry.origin_country.as_str())
            .bind(entry.main_impact_country.as_str())
            .bind(entry.relevant_exchange.as_str())
            .bind(entry.event_type.as_str())
            .bind(entry.who_input.as_str())
            .bind(format_timestamp(&entry.when_input))
            .bind(entry.details.as_str())
            .execute(&self.pool)
            .await?;
        Ok(entry)
    }

    /// Overwrites every column; fields absent from `patch` become empty
    /// (the timestamp becomes the Unix epoch).
    async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, ApiError> {
        let entry = patch.into_overwrite().with_id(id.clone());
        let result = sqlx::query(UPDATE_ENTRY)
            .bind(entry.date.as_str())
            .bind(entry.month.as_str())
            .bind(entry.origin_country.as_str())
            .bind(entry.main_impact_country.as_str())
            .bind(entry.relevant_exchange.as_str())
            .bind(entry.event_type.as_str())
            .bind(entry.who_input.as_str())
            .bind(format_timestamp(&entry.when_input))
            .bind(entry.details.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::entry_not_found());
        }
        Ok(entry)
    }

    async fn delete_entry(&self, id: &EntryId) -> Result<(), ApiError> {
        let result = sqlx::query(DELETE_ENTRY)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::entry_not_found());
        }
        Ok(())
    }
}

impl EventStore for SqlStorage {
    async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        let rows = sqlx::query_as::<_, EventRow>(SELECT_EVENTS)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(event_from_row).collect()
    }

    async fn create_event(
        &self,
        event: NewEvent,
        created_at: DateTime<Utc>,
    ) -> Result<Event, ApiError> {
        let id: i64 = sqlx::query_scalar(INSERT_EVENT)
            .bind(event.event_name.as_str())
            .bind(event.event_type.as_str())
            .bind(event.origin_country.as_str())
            .bind(event.main_impact_country.as_str())
            .bind(event.relevant_exchange.as_str())
            .bind(event.month.as_str())
            .bind(event.year.as_str())
            .bind(event.description.as_str())
            .bind(format_timestamp(&created_at))
            .fetch_one(&self.pool)
            .await?;
        Ok(event.into_event(id, created_at))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::entry::tests::full_patch;
    use crate::domain::event::tests::draft;

    async fn open_temp() -> (tempfile::TempDir, SqlStorage) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let file = dir.path().join("events.db");
        let storage = match SqlStorage::connect_sqlite(&file, 2).await {
            Ok(storage) => storage,
            Err(e) => panic!("open failed: {e}"),
        };
        (dir, storage)
    }

    fn names(values: &[DropdownValue]) -> Vec<(&str, i64)> {
        values
            .iter()
            .map(|v| (v.value.as_str(), v.order_index))
            .collect()
    }

    #[tokio::test]
    async fn append_then_reorder_scenario() {
        let (_dir, storage) = open_temp().await;
        let Ok(values) = storage.append_value(Category::Countries, "France").await else {
            panic!("append");
        };
        assert_eq!(names(&values), vec![("France", 0)]);
        let Ok(values) = storage.append_value(Category::Countries, "Japan").await else {
            panic!("append");
        };
        assert_eq!(names(&values), vec![("France", 0), ("Japan", 1)]);
        let order = vec!["Japan".to_string(), "France".to_string()];
        let Ok(values) = storage.reorder_values(Category::Countries, &order).await else {
            panic!("reorder");
        };
        assert_eq!(names(&values), vec![("Japan", 0), ("France", 1)]);
    }

    #[tokio::test]
    async fn append_is_idempotent() {
        let (_dir, storage) = open_temp().await;
        let Ok(first) = storage.append_value(Category::Exchanges, "TSE").await else {
            panic!("append");
        };
        let Ok(again) = storage.append_value(Category::Exchanges, "TSE").await else {
            panic!("append");
        };
        assert_eq!(first, again);
        assert_eq!(names(&again), vec![("TSE", 0)]);
    }

    #[tokio::test]
    async fn reorder_keeps_values_not_listed() {
        let (_dir, storage) = open_temp().await;
        for name in ["France", "Japan", "Germany"] {
            let _ = storage.append_value(Category::Countries, name).await;
        }
        let order = vec!["Japan".to_string(), "France".to_string(), "Atlantis".to_string()];
        let Ok(values) = storage.reorder_values(Category::Countries, &order).await else {
            panic!("reorder");
        };
        assert_eq!(
            names(&values),
            vec![("Japan", 0), ("France", 1), ("Germany", 2)]
        );
    }

    #[tokio::test]
    async fn reorder_with_repeated_value_keeps_first_position() {
        let (_dir, storage) = open_temp().await;
        for name in ["France", "Japan"] {
            let _ = storage.append_value(Category::Countries, name).await;
        }
        let order = ["Japan", "France", "Japan"].map(String::from);
        let Ok(values) = storage.reorder_values(Category::Countries, &order).await else {
            panic!("reorder");
        };
        assert_eq!(names(&values), vec![("Japan", 0), ("France", 1)]);
    }

    #[tokio::test]
    async fn failed_reorder_leaves_previous_order() {
        let (_dir, storage) = open_temp().await;
        for name in ["France", "Japan", "Germany"] {
            let _ = storage.append_value(Category::Countries, name).await;
        }
        let trigger = "CREATE TRIGGER reject_germany BEFORE UPDATE ON countries \
                       WHEN NEW.value = 'Germany' \
                       BEGIN SELECT RAISE(ABORT, 'rejected'); END";
        let Ok(_) = sqlx::query(trigger).execute(&storage.pool).await else {
            panic!("create trigger");
        };

        let order = ["Japan", "France", "Germany"].map(String::from);
        let result = storage.reorder_values(Category::Countries, &order).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));

        let Ok(values) = storage.list_values(Category::Countries).await else {
            panic!("list");
        };
        assert_eq!(
            names(&values),
            vec![("France", 0), ("Japan", 1), ("Germany", 2)]
        );
    }

    #[tokio::test]
    async fn remove_missing_value_is_not_found() {
        let (_dir, storage) = open_temp().await;
        let _ = storage.append_value(Category::EventTypes, "Strike").await;
        let Ok(values) = storage.remove_value(Category::EventTypes, "Strike").await else {
            panic!("remove");
        };
        assert!(values.is_empty());
        let again = storage.remove_value(Category::EventTypes, "Strike").await;
        assert!(matches!(again, Err(ApiError::NotFound(ref m)) if m == "Value not found"));
    }

    #[tokio::test]
    async fn entry_lifecycle() {
        let (_dir, storage) = open_temp().await;
        let Ok(new_entry) = full_patch("first", "2024-05-01T10:00:00Z").into_new_entry() else {
            panic!("valid");
        };
        let Ok(created) = storage.create_entry(new_entry).await else {
            panic!("create");
        };
        let Ok(listed) = storage.list_entries().await else {
            panic!("list");
        };
        assert_eq!(listed, vec![created.clone()]);

        let Ok(updated) = storage
            .update_entry(&created.id, full_patch("second", "2024-05-03T10:00:00Z"))
            .await
        else {
            panic!("update");
        };
        let Ok(listed) = storage.list_entries().await else {
            panic!("list");
        };
        assert_eq!(listed, vec![updated]);

        assert!(storage.delete_entry(&created.id).await.is_ok());
        let again = storage.delete_entry(&created.id).await;
        assert!(matches!(again, Err(ApiError::NotFound(ref m)) if m == "Entry not found"));
    }

    #[tokio::test]
    async fn update_overwrites_absent_fields_with_empty_values() {
        let (_dir, storage) = open_temp().await;
        let Ok(new_entry) = full_patch("kept?", "2024-05-01T10:00:00Z").into_new_entry() else {
            panic!("valid");
        };
        let Ok(created) = storage.create_entry(new_entry).await else {
            panic!("create");
        };
        let patch = EntryPatch {
            month: Some("June".into()),
            ..EntryPatch::default()
        };
        let Ok(updated) = storage.update_entry(&created.id, patch).await else {
            panic!("update");
        };
        assert_eq!(updated.month, "June");
        assert!(updated.details.is_empty());
        assert!(updated.origin_country.is_empty());
        assert_eq!(updated.when_input, DateTime::<Utc>::default());

        let Ok(listed) = storage.list_entries().await else {
            panic!("list");
        };
        assert_eq!(listed, vec![updated]);
    }

    #[tokio::test]
    async fn sub_microsecond_when_input_round_trips() {
        let (_dir, storage) = open_temp().await;
        let Ok(new_entry) =
            full_patch("precise", "2024-05-01T10:00:00.123456789Z").into_new_entry()
        else {
            panic!("valid");
        };
        let Ok(created) = storage.create_entry(new_entry).await else {
            panic!("create");
        };
        let Ok(listed) = storage.list_entries().await else {
            panic!("list");
        };
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_dir, storage) = open_temp().await;
        let result = storage
            .update_entry(&EntryId::new("999"), EntryPatch::default())
            .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn event_ids_strictly_increase() {
        let (_dir, storage) = open_temp().await;
        let start = Utc::now();
        let mut ids = Vec::new();
        for (offset, name) in (0_i64..).zip(["a", "b", "c"]) {
            let Ok(event) = draft(name).into_new_event() else {
                panic!("valid draft");
            };
            let created_at = start + chrono::Duration::seconds(offset);
            let Ok(created) = storage.create_event(event, created_at).await else {
                panic!("create");
            };
            ids.push(created.id);
        }
        assert!(ids.windows(2).all(|w| matches!(w, [a, b] if a < b)));

        let Ok(listed) = storage.list_events().await else {
            panic!("list");
        };
        let names: Vec<&str> = listed.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }
}
