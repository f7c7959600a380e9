//! Tracker service: validates requests and drives the storage backend.

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::StorageType;
use crate::domain::{
    Category, DropdownKey, DropdownValue, Entry, EntryId, EntryPatch, Event, EventDraft,
};
use crate::error::ApiError;
use crate::persistence::{DropdownStore, EntryStore, EventStore, Storage};

/// Every dropdown list keyed the way the entry form addresses them, each
/// in display order.
///
/// Both country keys carry the same `countries` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DropdownLists {
    /// Values for the origin country field.
    pub origin_country: Vec<DropdownValue>,
    /// Values for the main impact country field.
    pub main_impact_country: Vec<DropdownValue>,
    /// Values for the relevant exchange field.
    pub relevant_exchange: Vec<DropdownValue>,
    /// Values for the event type field.
    pub event_type: Vec<DropdownValue>,
}

/// Orchestration layer for entries, dropdowns and events.
///
/// Owns the [`Storage`] chosen at startup. Mutations are validated here
/// before any store call and logged once they succeed.
#[derive(Debug)]
pub struct TrackerService {
    storage: Storage,
}

impl TrackerService {
    /// Creates a service over an opened storage backend.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Returns a reference to the inner [`Storage`].
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Which backend is active.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        self.storage.storage_type()
    }

    // -- entries -------------------------------------------------------------

    /// Lists all entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, ApiError> {
        self.storage.list_entries().await
    }

    /// Creates an entry from a complete request body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if a field is missing or blank, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn create_entry(&self, patch: EntryPatch) -> Result<Entry, ApiError> {
        let new_entry = patch.into_new_entry()?;
        let entry = self.storage.create_entry(new_entry).await?;
        tracing::info!(id = %entry.id, event_type = %entry.event_type, "entry created");
        Ok(entry)
    }

    /// Updates the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the id is unknown, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn update_entry(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, ApiError> {
        let entry = self.storage.update_entry(id, patch).await?;
        tracing::info!(id = %entry.id, "entry updated");
        Ok(entry)
    }

    /// Deletes the entry with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the id is unknown, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn delete_entry(&self, id: &EntryId) -> Result<(), ApiError> {
        self.storage.delete_entry(id).await?;
        tracing::info!(%id, "entry deleted");
        Ok(())
    }

    // -- dropdowns -----------------------------------------------------------

    /// Reads every dropdown list. The countries list is read once and
    /// shared by both country keys.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    pub async fn dropdowns(&self) -> Result<DropdownLists, ApiError> {
        let countries = self.storage.list_values(Category::Countries).await?;
        let exchanges = self.storage.list_values(Category::Exchanges).await?;
        let event_types = self.storage.list_values(Category::EventTypes).await?;
        Ok(DropdownLists {
            origin_country: countries.clone(),
            main_impact_country: countries,
            relevant_exchange: exchanges,
            event_type: event_types,
        })
    }

    /// Appends `value` to the list behind `key` and returns the updated
    /// list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an empty value or an unknown
    /// key, or [`ApiError::Internal`] on storage failure.
    pub async fn add_dropdown_value(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        require_value(value)?;
        let category = resolve(key)?;
        let values = self.storage.append_value(category, value).await?;
        tracing::info!(%category, value, "dropdown value added");
        Ok(values)
    }

    /// Removes `value` from the list behind `key` and returns the updated
    /// list.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an empty value or an unknown
    /// key, [`ApiError::NotFound`] if the value is absent, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn remove_dropdown_value(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<DropdownValue>, ApiError> {
        require_value(value)?;
        let category = resolve(key)?;
        let values = self.storage.remove_value(category, value).await?;
        tracing::info!(%category, value, "dropdown value removed");
        Ok(values)
    }

    /// Reorders the list behind `key` to follow `values`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for an unknown key, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn reorder_dropdown(
        &self,
        key: &str,
        values: &[String],
    ) -> Result<Vec<DropdownValue>, ApiError> {
        let category = resolve(key)?;
        let reordered = self.storage.reorder_values(category, values).await?;
        tracing::info!(%category, count = values.len(), "dropdown reordered");
        Ok(reordered)
    }

    // -- events --------------------------------------------------------------

    /// Lists all events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] on storage failure.
    pub async fn list_events(&self) -> Result<Vec<Event>, ApiError> {
        self.storage.list_events().await
    }

    /// Validates and appends an event stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] if a field is missing or blank, or
    /// [`ApiError::Internal`] on storage failure.
    pub async fn create_event(&self, draft: EventDraft) -> Result<Event, ApiError> {
        let new_event = draft.into_new_event()?;
        // Stored timestamps keep microseconds; truncate so the response
        // matches what a later read returns.
        let created_at = Utc::now().trunc_subsecs(6);
        let event = self.storage.create_event(new_event, created_at).await?;
        tracing::info!(id = event.id, name = %event.event_name, "event created");
        Ok(event)
    }
}

fn resolve(key: &str) -> Result<Category, ApiError> {
    key.parse::<DropdownKey>().map(DropdownKey::category)
}

fn require_value(value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::Validation("Value is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::entry::tests::full_patch;
    use crate::domain::event::tests::draft;
    use crate::persistence::CsvStorage;

    async fn make_service() -> (tempfile::TempDir, TrackerService) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let Ok(csv) = CsvStorage::open(dir.path()).await else {
            panic!("open storage");
        };
        (dir, TrackerService::new(Storage::Csv(csv)))
    }

    #[tokio::test]
    async fn country_keys_share_one_list() {
        let (_dir, service) = make_service().await;
        let Ok(_) = service.add_dropdown_value("origin_country", "France").await else {
            panic!("add");
        };
        let Ok(_) = service.add_dropdown_value("main_impact_country", "Japan").await else {
            panic!("add");
        };
        let Ok(lists) = service.dropdowns().await else {
            panic!("dropdowns");
        };
        assert_eq!(
            lists.origin_country,
            vec![DropdownValue::new("France", 0), DropdownValue::new("Japan", 1)]
        );
        assert_eq!(lists.origin_country, lists.main_impact_country);
        assert!(lists.relevant_exchange.is_empty());
        assert!(lists.event_type.is_empty());
    }

    #[tokio::test]
    async fn unknown_key_is_rejected() {
        let (_dir, service) = make_service().await;
        let result = service.add_dropdown_value("bogus", "x").await;
        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == "Invalid dropdown key"));
        let result = service.reorder_dropdown("bogus", &[]).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_value_is_rejected() {
        let (_dir, service) = make_service().await;
        let result = service.add_dropdown_value("event_type", "").await;
        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == "Value is required"));
        let result = service.remove_dropdown_value("bogus", "").await;
        assert!(matches!(result, Err(ApiError::Validation(ref m)) if m == "Value is required"));
    }

    #[tokio::test]
    async fn mutations_return_values_in_display_order() {
        let (_dir, service) = make_service().await;
        for value in ["NYSE", "LSE", "TSE"] {
            let _ = service.add_dropdown_value("relevant_exchange", value).await;
        }
        let order = vec!["TSE".to_string(), "NYSE".to_string(), "LSE".to_string()];
        let Ok(values) = service.reorder_dropdown("relevant_exchange", &order).await else {
            panic!("reorder");
        };
        assert_eq!(
            values,
            vec![
                DropdownValue::new("TSE", 0),
                DropdownValue::new("NYSE", 1),
                DropdownValue::new("LSE", 2),
            ]
        );
        let Ok(values) = service.remove_dropdown_value("relevant_exchange", "NYSE").await else {
            panic!("remove");
        };
        assert_eq!(
            values,
            vec![DropdownValue::new("TSE", 0), DropdownValue::new("LSE", 2)]
        );
    }

    #[tokio::test]
    async fn create_entry_requires_all_fields() {
        let (_dir, service) = make_service().await;
        let patch = EntryPatch {
            date: Some("2024-05-01".into()),
            ..EntryPatch::default()
        };
        let result = service.create_entry(patch).await;
        let Err(ApiError::Validation(message)) = result else {
            panic!("expected validation error");
        };
        assert!(message.starts_with("Missing required fields: month"));

        let Ok(entries) = service.list_entries().await else {
            panic!("list");
        };
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn entry_round_trip() {
        let (_dir, service) = make_service().await;
        let Ok(created) = service
            .create_entry(full_patch("x", "2024-05-01T10:00:00Z"))
            .await
        else {
            panic!("create");
        };
        let Ok(entries) = service.list_entries().await else {
            panic!("list");
        };
        assert_eq!(entries, vec![created.clone()]);
        assert!(service.delete_entry(&created.id).await.is_ok());
    }

    #[tokio::test]
    async fn events_get_sequential_ids_and_server_time() {
        let (_dir, service) = make_service().await;
        let before = Utc::now().trunc_subsecs(6);
        let Ok(first) = service.create_event(draft("first")).await else {
            panic!("create");
        };
        let Ok(second) = service.create_event(draft("second")).await else {
            panic!("create");
        };
        assert_eq!((first.id, second.id), (1, 2));
        assert!(first.created_at >= before);
        assert!(second.created_at >= first.created_at);
    }

    #[tokio::test]
    async fn invalid_event_is_rejected() {
        let (_dir, service) = make_service().await;
        let result = service.create_event(EventDraft::default()).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }
}
