//! Entry identifiers derived from the millisecond clock.
//!
//! [`EntryId`] is a newtype over the decimal rendering of a Unix timestamp
//! in milliseconds. [`EntryIdGenerator`] hands out strictly increasing ids:
//! a second create within the same millisecond receives the previous id
//! plus one, so ids issued by one process never collide.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier of an [`super::Entry`].
///
/// Assigned once at creation and immutable thereafter. Ids read back from
/// storage are taken verbatim, whatever their shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Wraps an id read from storage or a request path.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntryId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

/// Issues strictly increasing millisecond-based [`EntryId`]s.
#[derive(Debug, Default)]
pub struct EntryIdGenerator {
    last_issued: AtomicI64,
}

impl EntryIdGenerator {
    /// Creates a generator with no issued ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id: the current millisecond timestamp, or the last
    /// issued value plus one when the clock has not advanced past it.
    pub fn next_id(&self) -> EntryId {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last_issued.load(Ordering::Acquire);
        loop {
            let candidate = if now > prev { now } else { prev.saturating_add(1) };
            match self.last_issued.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return EntryId(candidate.to_string()),
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_decimal_millis() {
        let before = Utc::now().timestamp_millis();
        let id = EntryIdGenerator::new().next_id();
        let Ok(millis) = id.as_str().parse::<i64>() else {
            panic!("id should be decimal digits");
        };
        assert!(millis >= before);
    }

    #[test]
    fn rapid_ids_never_collide() {
        let generator = EntryIdGenerator::new();
        let ids: Vec<i64> = (0..1_000)
            .filter_map(|_| generator.next_id().as_str().parse().ok())
            .collect();
        assert_eq!(ids.len(), 1_000);
        assert!(ids.windows(2).all(|w| matches!(w, [a, b] if a < b)));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = EntryId::new("1714566600000");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"1714566600000\""));
    }
}
