//! Append-only historical events, distinct from entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::entry::required;
use crate::error::ApiError;

/// An immutable event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    /// Backend-assigned sequential id.
    pub id: i64,
    /// Event name.
    pub event_name: String,
    /// Event type.
    pub event_type: String,
    /// Origin country.
    pub origin_country: String,
    /// Main impact country.
    pub main_impact_country: String,
    /// Relevant exchange.
    pub relevant_exchange: String,
    /// Month label.
    pub month: String,
    /// Year label.
    pub year: String,
    /// Free-text description.
    pub description: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Event contents supplied by the client; id and `created_at` are assigned
/// by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Event name.
    pub event_name: String,
    /// Event type.
    pub event_type: String,
    /// Origin country.
    pub origin_country: String,
    /// Main impact country.
    pub main_impact_country: String,
    /// Relevant exchange.
    pub relevant_exchange: String,
    /// Month label.
    pub month: String,
    /// Year label.
    pub year: String,
    /// Free-text description.
    pub description: String,
}

impl NewEvent {
    /// Attaches the server-assigned id and creation time.
    #[must_use]
    pub fn into_event(self, id: i64, created_at: DateTime<Utc>) -> Event {
        Event {
            id,
            event_name: self.event_name,
            event_type: self.event_type,
            origin_country: self.origin_country,
            main_impact_country: self.main_impact_country,
            relevant_exchange: self.relevant_exchange,
            month: self.month,
            year: self.year,
            description: self.description,
            created_at,
        }
    }
}

/// Wire form of `POST /events`; every field optional until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct EventDraft {
    /// Event name.
    #[serde(default)]
    pub event_name: Option<String>,
    /// Event type.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Origin country.
    #[serde(default)]
    pub origin_country: Option<String>,
    /// Main impact country.
    #[serde(default)]
    pub main_impact_country: Option<String>,
    /// Relevant exchange.
    #[serde(default)]
    pub relevant_exchange: Option<String>,
    /// Month label.
    #[serde(default)]
    pub month: Option<String>,
    /// Year label.
    #[serde(default)]
    pub year: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
}

impl EventDraft {
    /// Validates the draft into a [`NewEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] listing every field that is absent
    /// or blank.
    pub fn into_new_event(self) -> Result<NewEvent, ApiError> {
        let mut missing = Vec::new();
        let event = NewEvent {
            event_name: required("event_name", self.event_name, &mut missing),
            event_type: required("event_type", self.event_type, &mut missing),
            origin_country: required("origin_country", self.origin_country, &mut missing),
            main_impact_country: required(
                "main_impact_country",
                self.main_impact_country,
                &mut missing,
            ),
            relevant_exchange: required("relevant_exchange", self.relevant_exchange, &mut missing),
            month: required("month", self.month, &mut missing),
            year: required("year", self.year, &mut missing),
            description: required("description", self.description, &mut missing),
        };
        if missing.is_empty() {
            Ok(event)
        } else {
            Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }
}
