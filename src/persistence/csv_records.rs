//! Conversions between domain entities and codec [`Record`]s.

use chrono::{DateTime, Utc};

use super::codec::{FieldValue, ORDER_INDEX_COLUMN, Record};
use crate::domain::timestamp::parse_timestamp;
use crate::domain::{DropdownValue, Entry, EntryId, Event};
use crate::error::ApiError;

/// An entity with a fixed column schema in a delimited file.
pub trait CsvRecord: Sized {
    /// Renders the entity as one row.
    fn to_record(&self) -> Record;

    /// Rebuilds the entity from a decoded row.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Internal`] when a typed column holds an
    /// unparseable value.
    fn from_record(record: &Record) -> Result<Self, ApiError>;
}

fn text(record: &Record, column: &str) -> String {
    record.get(column).map(FieldValue::render).unwrap_or_default()
}

fn timestamp(record: &Record, column: &str) -> Result<DateTime<Utc>, ApiError> {
    match record.get(column) {
        Some(FieldValue::Timestamp(ts)) => Ok(*ts),
        Some(FieldValue::Text(raw)) => parse_timestamp(raw)
            .ok_or_else(|| ApiError::Internal(format!("malformed {column} timestamp: {raw}"))),
        Some(FieldValue::Integer(n)) => {
            Err(ApiError::Internal(format!("malformed {column} timestamp: {n}")))
        }
        None => Err(ApiError::Internal(format!("missing {column} column"))),
    }
}

fn integer(record: &Record, column: &str) -> Result<i64, ApiError> {
    match record.get(column) {
        Some(FieldValue::Integer(n)) => Ok(*n),
        Some(FieldValue::Text(raw)) => raw
            .trim()
            .parse()
            .map_err(|_| ApiError::Internal(format!("malformed {column} value: {raw}"))),
        Some(FieldValue::Timestamp(_)) | None => {
            Err(ApiError::Internal(format!("missing {column} column")))
        }
    }
}

fn row<const N: usize>(cells: [(&str, FieldValue); N]) -> Record {
    cells
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

impl CsvRecord for DropdownValue {
    fn to_record(&self) -> Record {
        row([
            ("value", self.value.as_str().into()),
            (ORDER_INDEX_COLUMN, self.order_index.into()),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, ApiError> {
        let order_index = match record.get(ORDER_INDEX_COLUMN) {
            Some(FieldValue::Integer(n)) => *n,
            _ => 0,
        };
        Ok(Self {
            value: text(record, "value"),
            order_index,
        })
    }
}

impl CsvRecord for Entry {
    fn to_record(&self) -> Record {
        row([
            ("id", self.id.as_str().into()),
            ("date", self.date.as_str().into()),
            ("month", self.month.as_str().into()),
            ("origin_country", self.origin_country.as_str().into()),
            ("main_impact_country", self.main_impact_country.as_str().into()),
            ("relevant_exchange", self.relevant_exchange.as_str().into()),
            ("event_type", self.event_type.as_str().into()),
            ("who_input", self.who_input.as_str().into()),
            ("when_input", self.when_input.into()),
            ("details", self.details.as_str().into()),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, ApiError> {
        Ok(Self {
            id: EntryId::new(text(record, "id")),
            date: text(record, "date"),
            month: text(record, "month"),
            origin_country: text(record, "origin_country"),
            main_impact_country: text(record, "main_impact_country"),
            relevant_exchange: text(record, "relevant_exchange"),
            event_type: text(record, "event_type"),
            who_input: text(record, "who_input"),
            when_input: timestamp(record, "when_input")?,
            details: text(record, "details"),
        })
    }
}

impl CsvRecord for Event {
    fn to_record(&self) -> Record {
        row([
            ("id", self.id.into()),
            ("event_name", self.event_name.as_str().into()),
            ("event_type", self.event_type.as_str().into()),
            ("origin_country", self.origin_country.as_str().into()),
            ("main_impact_country", self.main_impact_country.as_str().into()),
            ("relevant_exchange", self.relevant_exchange.as_str().into()),
            ("month", self.month.as_str().into()),
            ("year", self.year.as_str().into()),
            ("description", self.description.as_str().into()),
            ("created_at", self.created_at.into()),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, ApiError> {
        Ok(Self {
            id: integer(record, "id")?,
            event_name: text(record, "event_name"),
            event_type: text(record, "event_type"),
            origin_country: text(record, "origin_country"),
            main_impact_country: text(record, "main_impact_country"),
            relevant_exchange: text(record, "relevant_exchange"),
            month: text(record, "month"),
            year: text(record, "year"),
            description: text(record, "description"),
            created_at: timestamp(record, "created_at")?,
        })
    }
}

/// Converts every decoded row into `T`.
///
/// # Errors
///
/// Propagates the first row conversion failure.
pub fn from_records<T: CsvRecord>(records: &[Record]) -> Result<Vec<T>, ApiError> {
    records.iter().map(T::from_record).collect()
}

/// Renders every entity as a row.
#[must_use]
pub fn to_records<T: CsvRecord>(items: &[T]) -> Vec<Record> {
    items.iter().map(CsvRecord::to_record).collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::codec::{decode, encode};

    #[test]
    fn entry_header_is_sorted_field_names() {
        let Some(when) = parse_timestamp("2024-05-01T10:00:00Z") else {
            panic!("valid timestamp");
        };
        let entry = Entry {
            id: EntryId::new("1714557600000"),
            date: "2024-05-01".into(),
            month: "May".into(),
            origin_country: "France".into(),
            main_impact_country: "Japan".into(),
            relevant_exchange: "TSE".into(),
            event_type: "Election".into(),
            who_input: "analyst".into(),
            when_input: when,
            details: "snap vote, surprise".into(),
        };
        let bytes = encode(&to_records(std::slice::from_ref(&entry)));
        let Ok(text) = String::from_utf8(bytes.clone()) else {
            panic!("utf-8");
        };
        assert!(text.starts_with(
            "date,details,event_type,id,main_impact_country,month,origin_country,\
             relevant_exchange,when_input,who_input\n"
        ));

        let Ok(records) = decode(&bytes) else {
            panic!("decode");
        };
        let Ok(back) = from_records::<Entry>(&records) else {
            panic!("from_records");
        };
        assert_eq!(back, vec![entry]);
    }

    #[test]
    fn event_with_bad_id_is_internal_error() {
        let Ok(records) = decode(b"created_at,id\n2024-05-01T10:00:00Z,abc\n") else {
            panic!("decode");
        };
        let result = from_records::<Event>(&records);
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn dropdown_value_reads_order_index() {
        let Ok(records) = decode(b"value,order_index\nNYSE,7\n") else {
            panic!("decode");
        };
        let Ok(values) = from_records::<DropdownValue>(&records) else {
            panic!("from_records");
        };
        assert_eq!(values, vec![DropdownValue::new("NYSE", 7)]);
    }
}
