//! Controlled-vocabulary dropdown lists.
//!
//! Values live in one of three server-side [`Category`]s. Clients address
//! them through four [`DropdownKey`]s; both country keys share the
//! `countries` category.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ApiError;

/// Server-side grouping of dropdown values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Country names.
    Countries,
    /// Exchange names.
    Exchanges,
    /// Event type labels.
    EventTypes,
}

impl Category {
    /// Table and file stem for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Countries => "countries",
            Self::Exchanges => "exchanges",
            Self::EventTypes => "event_types",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-facing dropdown key, as used in `/dropdowns/{key}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropdownKey {
    /// `origin_country`
    OriginCountry,
    /// `main_impact_country`
    MainImpactCountry,
    /// `relevant_exchange`
    RelevantExchange,
    /// `event_type`
    EventType,
}

impl DropdownKey {
    /// The category the key reads and writes.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::OriginCountry | Self::MainImpactCountry => Category::Countries,
            Self::RelevantExchange => Category::Exchanges,
            Self::EventType => Category::EventTypes,
        }
    }
}

impl FromStr for DropdownKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "origin_country" => Ok(Self::OriginCountry),
            "main_impact_country" => Ok(Self::MainImpactCountry),
            "relevant_exchange" => Ok(Self::RelevantExchange),
            "event_type" => Ok(Self::EventType),
            _ => Err(ApiError::Validation("Invalid dropdown key".to_string())),
        }
    }
}

/// One value of a dropdown category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DropdownValue {
    /// The suggestion text, unique within its category.
    pub value: String,
    /// Display position; lists are sorted ascending by it. Gaps are allowed.
    pub order_index: i64,
}

impl DropdownValue {
    /// Creates a value at the given position.
    #[must_use]
    pub fn new(value: impl Into<String>, order_index: i64) -> Self {
        Self {
            value: value.into(),
            order_index,
        }
    }
}

/// Index for a value appended to `values`: one past the current maximum,
/// or `0` for an empty list.
#[must_use]
pub fn next_order_index(values: &[DropdownValue]) -> i64 {
    values
        .iter()
        .map(|v| v.order_index)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Assigns each distinct value its 0-based position in `values`.
///
/// A repeated value keeps its first position; later repeats are skipped so
/// a category never holds the same value twice.
#[must_use]
pub fn positioned(values: &[String]) -> Vec<DropdownValue> {
    let mut seen = HashSet::new();
    (0_i64..)
        .zip(values.iter().filter(|v| seen.insert(v.as_str())))
        .map(|(i, v)| DropdownValue::new(v.as_str(), i))
        .collect()
}
