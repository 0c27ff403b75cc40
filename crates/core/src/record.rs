//! Typed cell records decoded from the evaluation service's tabular body.
//!
//! The service emits one row per active minute of the day:
//!
//! ```text
//! key,h,m,count,expressions
//! 00:01,0,1,2,"0 * * * * ?
//! 0 1 * * * ?"
//! ```
//!
//! A row that is missing any of the five columns, or whose numbers cannot be
//! placed on the grid, is partial server output and is dropped silently.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const HOURS_PER_DAY: u8 = 24;
pub const MINUTES_PER_HOUR: u8 = 60;

/// One minute of the day and the expressions that fire in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Display label, e.g. `"01:02"`. Identity for reconciliation.
    pub key: String,
    pub hour: u8,
    pub minute: u8,
    /// Number of firings in this minute, always at least 1.
    pub count: u32,
    /// Contributing expressions in service order, never empty.
    pub expressions: Vec<String>,
}

impl CellRecord {
    /// `"2 events at 00:01"`, without trailing punctuation.
    pub fn headline(&self) -> String {
        format!("{} at {}", events_label(self.count), self.key)
    }
}

/// `"1 event"`, `"3 events"`.
pub fn events_label(count: u32) -> String {
    format!("{} event{}", count, if count == 1 { "" } else { "s" })
}

/// A row exactly as read from the table, before presence checks.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct RawRow {
    pub key: Option<String>,
    pub h: Option<String>,
    pub m: Option<String>,
    pub count: Option<String>,
    pub expressions: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

fn number<T: std::str::FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

/// Convert one raw row, or `None` when the row cannot become a cell.
pub fn convert_row(raw: &RawRow) -> Option<CellRecord> {
    let key = present(&raw.key)?;
    let hour: u8 = number(present(&raw.h)?)?;
    let minute: u8 = number(present(&raw.m)?)?;
    let count: u32 = number(present(&raw.count)?)?;
    let expressions = split_expressions(present(&raw.expressions)?);

    if count == 0 || hour >= HOURS_PER_DAY || minute >= MINUTES_PER_HOUR || expressions.is_empty() {
        return None;
    }

    Some(CellRecord {
        key: key.to_string(),
        hour,
        minute,
        count,
        expressions,
    })
}

/// Split a multi-line `expressions` cell on `\n` or `\r`.
pub fn split_expressions(cell: &str) -> Vec<String> {
    cell.split(['\n', '\r'])
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode a whole response body into records, dropping malformed rows.
pub fn parse_table(body: &str) -> Result<Vec<CellRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut dropped = 0usize;
    for row in reader.deserialize::<RawRow>() {
        match convert_row(&row?) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, kept = records.len(), "Dropped malformed rows");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(key: &str, h: &str, m: &str, count: &str, expressions: &str) -> RawRow {
        let field = |s: &str| Some(s.to_string());
        RawRow {
            key: field(key),
            h: field(h),
            m: field(m),
            count: field(count),
            expressions: field(expressions),
        }
    }

    #[test]
    fn converts_complete_row() {
        let record = convert_row(&raw("01:02", "1", "2", "3", "a\nb\rc")).unwrap();
        assert_eq!(record.key, "01:02");
        assert_eq!((record.hour, record.minute, record.count), (1, 2, 3));
        assert_eq!(record.expressions, vec!["a", "b", "c"]);
    }

    #[test]
    fn hour_and_minute_zero_are_present() {
        let record = convert_row(&raw("00:00", "0", "0", "1", "x")).unwrap();
        assert_eq!((record.hour, record.minute), (0, 0));
    }

    #[test]
    fn drops_rows_with_missing_fields() {
        assert!(convert_row(&raw("", "1", "2", "3", "a")).is_none());
        assert!(convert_row(&raw("k", "", "2", "3", "a")).is_none());
        assert!(convert_row(&raw("k", "1", "", "3", "a")).is_none());
        assert!(convert_row(&raw("k", "1", "2", "", "a")).is_none());
        assert!(convert_row(&raw("k", "1", "2", "3", "")).is_none());
        assert!(convert_row(&RawRow::default()).is_none());
    }

    #[test]
    fn drops_rows_with_non_numeric_fields() {
        assert!(convert_row(&raw("k", "x", "2", "3", "a")).is_none());
        assert!(convert_row(&raw("k", "1", "NaN", "3", "a")).is_none());
        assert!(convert_row(&raw("k", "1", "2", "three", "a")).is_none());
    }

    #[test]
    fn drops_rows_off_the_grid() {
        assert!(convert_row(&raw("k", "24", "0", "1", "a")).is_none());
        assert!(convert_row(&raw("k", "0", "60", "1", "a")).is_none());
        assert!(convert_row(&raw("k", "0", "0", "0", "a")).is_none());
        assert!(convert_row(&raw("k", "0", "0", "1", "\n\r")).is_none());
    }

    #[test]
    fn parse_table_handles_quoted_multiline_cells() {
        let body = "key,h,m,count,expressions\n\
                    00:01,0,1,2,\"0 * * * * ?\n0 1 * * * ?\"\n\
                    00:02,0,2,1,\"0 * * * * ?\"\n";
        let records = parse_table(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].expressions, vec!["0 * * * * ?", "0 1 * * * ?"]);
        assert_eq!(records[1].key, "00:02");
    }

    #[test]
    fn parse_table_drops_partial_rows() {
        let body = "key,h,m,count,expressions\n00:01,0,1,,x\n00:02,0,2,1,y\n00:03,0\n";
        let records = parse_table(body).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "00:02");
    }

    #[test]
    fn parse_table_header_only_is_empty() {
        assert!(parse_table("key,h,m,count,expressions\n").unwrap().is_empty());
        assert!(parse_table("").unwrap().is_empty());
    }

    #[test]
    fn headline_pluralizes() {
        let record = convert_row(&raw("00:01", "0", "1", "1", "x")).unwrap();
        assert_eq!(record.headline(), "1 event at 00:01");
        assert_eq!(events_label(2), "2 events");
    }
}
