//! Market-event entries: the primary mutable resource.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::EntryId;
use super::timestamp::deserialize_opt_timestamp;
use crate::error::ApiError;

/// One user-submitted record about an event affecting markets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Entry {
    /// Generated identifier (immutable after creation).
    pub id: EntryId,
    /// Date of the event as entered by the user.
    pub date: String,
    /// Month label.
    pub month: String,
    /// Country where the event originated.
    pub origin_country: String,
    /// Country most affected by the event.
    pub main_impact_country: String,
    /// Exchange the event relates to.
    pub relevant_exchange: String,
    /// Free-text category, suggested by the `event_types` dropdown.
    pub event_type: String,
    /// Who entered the record.
    pub who_input: String,
    /// When the record was entered.
    pub when_input: DateTime<Utc>,
    /// Free-text details.
    pub details: String,
}

/// Entry contents without an id, as accepted by create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    /// Date of the event.
    pub date: String,
    /// Month label.
    pub month: String,
    /// Origin country.
    pub origin_country: String,
    /// Main impact country.
    pub main_impact_country: String,
    /// Relevant exchange.
    pub relevant_exchange: String,
    /// Event type.
    pub event_type: String,
    /// Who entered the record.
    pub who_input: String,
    /// When the record was entered.
    pub when_input: DateTime<Utc>,
    /// Free-text details.
    pub details: String,
}

impl NewEntry {
    /// Attaches an id, producing the stored form.
    #[must_use]
    pub fn with_id(self, id: EntryId) -> Entry {
        Entry {
            id,
            date: self.date,
            month: self.month,
            origin_country: self.origin_country,
            main_impact_country: self.main_impact_country,
            relevant_exchange: self.relevant_exchange,
            event_type: self.event_type,
            who_input: self.who_input,
            when_input: self.when_input,
            details: self.details,
        }
    }
}

/// Entry fields as sent by clients on create and update.
///
/// Every field is optional on the wire. Create requires all of them;
/// update overwrites all nine, blanking the ones left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
pub struct EntryPatch {
    /// Date of the event.
    #[serde(default)]
    pub date: Option<String>,
    /// Month label.
    #[serde(default)]
    pub month: Option<String>,
    /// Origin country.
    #[serde(default)]
    pub origin_country: Option<String>,
    /// Main impact country.
    #[serde(default)]
    pub main_impact_country: Option<String>,
    /// Relevant exchange.
    #[serde(default)]
    pub relevant_exchange: Option<String>,
    /// Event type.
    #[serde(default)]
    pub event_type: Option<String>,
    /// Who entered the record.
    #[serde(default)]
    pub who_input: Option<String>,
    /// When the record was entered (RFC 3339, or offset-less UTC).
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub when_input: Option<DateTime<Utc>>,
    /// Free-text details.
    #[serde(default)]
    pub details: Option<String>,
}

impl EntryPatch {
    /// Converts a create request into a [`NewEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] listing every field that is absent
    /// or blank.
    pub fn into_new_entry(self) -> Result<NewEntry, ApiError> {
        let mut missing = Vec::new();
        let date = required("date", self.date, &mut missing);
        let month = required("month", self.month, &mut missing);
        let origin_country = required("origin_country", self.origin_country, &mut missing);
        let main_impact_country =
            required("main_impact_country", self.main_impact_country, &mut missing);
        let relevant_exchange = required("relevant_exchange", self.relevant_exchange, &mut missing);
        let event_type = required("event_type", self.event_type, &mut missing);
        let who_input = required("who_input", self.who_input, &mut missing);
        let when_input = self.when_input;
        if when_input.is_none() {
            missing.push("when_input");
        }
        let details = required("details", self.details, &mut missing);

        match when_input {
            Some(when_input) if missing.is_empty() => Ok(NewEntry {
                date,
                month,
                origin_country,
                main_impact_country,
                relevant_exchange,
                event_type,
                who_input,
                when_input: when_input.trunc_subsecs(6),
                details,
            }),
            _ => Err(ApiError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Fills every absent field with its empty value (empty string, Unix
    /// epoch), for a full overwrite of the nine data fields.
    #[must_use]
    pub fn into_overwrite(self) -> NewEntry {
        NewEntry {
            date: self.date.unwrap_or_default(),
            month: self.month.unwrap_or_default(),
            origin_country: self.origin_country.unwrap_or_default(),
            main_impact_country: self.main_impact_country.unwrap_or_default(),
            relevant_exchange: self.relevant_exchange.unwrap_or_default(),
            event_type: self.event_type.unwrap_or_default(),
            who_input: self.who_input.unwrap_or_default(),
            when_input: self.when_input.unwrap_or_default().trunc_subsecs(6),
            details: self.details.unwrap_or_default(),
        }
    }
}

/// Returns the non-blank value, or records `name` as missing.
pub(crate) fn required(
    name: &'static str,
    value: Option<String>,
    missing: &mut Vec<&'static str>,
) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            missing.push(name);
            String::new()
        }
    }
}
