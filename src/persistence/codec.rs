//! Delimited-file record codec.
//!
//! The first line of a file is the header row naming the columns; every
//! following line is one record whose cells are matched to the header by
//! position. A column named `order_index` decodes as an integer (malformed
//! cells read as `0`); every other column decodes as text.
//!
//! Encoding takes its header from the keys of the first record, sorted
//! lexicographically, so all records of one file must share a key set.
//! Cells containing a comma, a double quote or a line break are quoted
//! with embedded quotes doubled; all other cells are written bare.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::timestamp::format_timestamp;
use crate::error::ApiError;

/// Column whose cells decode as integers.
pub const ORDER_INDEX_COLUMN: &str = "order_index";

/// Header written for an empty record set and for freshly created files.
pub const DEFAULT_HEADER: [&str; 2] = ["value", ORDER_INDEX_COLUMN];

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text, written unchanged.
    Text(String),
    /// Integer, written as decimal digits.
    Integer(i64),
    /// Timestamp, written as fixed-precision RFC 3339 UTC.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Renders the value as cell text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Timestamp(ts) => format_timestamp(ts),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// One row: column name to typed value. Keys iterate in sorted order.
pub type Record = BTreeMap<String, FieldValue>;

/// Decodes file contents into records.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] when the contents are not UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Vec<Record>, ApiError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ApiError::Internal(format!("delimited file is not UTF-8: {e}")))?;
    let mut rows = split_rows(text).into_iter();
    let Some(headers) = rows.next() else {
        return Ok(Vec::new());
    };

    Ok(rows
        .map(|cells| {
            let record: Record = headers
                .iter()
                .zip(cells)
                .map(|(name, cell)| {
                    let value = if name == ORDER_INDEX_COLUMN {
                        FieldValue::Integer(cell.trim().parse().unwrap_or(0))
                    } else {
                        FieldValue::Text(cell)
                    };
                    (name.clone(), value)
                })
                .collect();
            record
        })
        .collect())
}

/// Encodes records, header first.
///
/// An empty slice yields the header-only [`DEFAULT_HEADER`] file.
#[must_use]
pub fn encode(records: &[Record]) -> Vec<u8> {
    let headers: Vec<&str> = match records.first() {
        Some(first) => first.keys().map(String::as_str).collect(),
        None => DEFAULT_HEADER.to_vec(),
    };

    let mut out = String::new();
    push_line(&mut out, headers.iter().map(|h| escape(h)));
    for record in records {
        push_line(
            &mut out,
            headers.iter().map(|h| {
                let cell = record.get(*h).map(FieldValue::render).unwrap_or_default();
                escape(&cell)
            }),
        );
    }
    out.into_bytes()
}

/// Reads and decodes `path`, creating it with [`DEFAULT_HEADER`] first if
/// it does not exist.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] when the file cannot be created, read or
/// decoded.
pub async fn read_records(path: &Path) -> Result<Vec<Record>, ApiError> {
    if !tokio::fs::try_exists(path).await? {
        write_records(path, &[]).await?;
    }
    let bytes = tokio::fs::read(path).await?;
    decode(&bytes)
}

/// Encodes `records` and replaces the contents of `path`.
///
/// The bytes go to a sibling temporary file that is then renamed over
/// `path`.
///
/// # Errors
///
/// Returns [`ApiError::Internal`] when the file cannot be written.
pub async fn write_records(path: &Path, records: &[Record]) -> Result<(), ApiError> {
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, encode(records)).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        out.push_str(&cell);
        first = false;
    }
    out.push('\n');
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Splits text into rows of cells, honouring quoted cells. Blank lines are
/// skipped.
fn split_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut quoted_cell = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' if cell.is_empty() && !quoted_cell => {
                in_quotes = true;
                quoted_cell = true;
            }
            ',' => {
                row.push(std::mem::take(&mut cell));
                quoted_cell = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                quoted_cell = false;
                finish_row(&mut rows, std::mem::take(&mut row));
            }
            _ => cell.push(c),
        }
    }
    if !cell.is_empty() || !row.is_empty() || quoted_cell {
        row.push(cell);
        finish_row(&mut rows, row);
    }
    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = matches!(row.as_slice(), [only] if only.is_empty());
    if !blank {
        rows.push(row);
    }
}
