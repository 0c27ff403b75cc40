//! "Most contention" report: the busiest minutes, grouped by count.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CrontentionError, Result};
use crate::record::{events_label, CellRecord};

/// At most this many distinct counts are reported.
pub const MAX_GROUPS: usize = 5;

/// At most this many keys are listed per count before eliding the rest.
pub const MAX_KEYS_PER_GROUP: usize = 4;

pub const ELLIPSIS: &str = "\u{2026}";

/// One line of the report, e.g. `2 events at 00:01, 01:01, 02:01, 03:01, …`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub count: u32,
    /// First keys of the group in ascending order.
    pub keys: Vec<String>,
    /// Whether the group had more members than `keys`.
    pub truncated: bool,
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", events_label(self.count), self.keys.join(", "))?;
        if self.truncated {
            write!(f, ", {ELLIPSIS}")?;
        }
        Ok(())
    }
}

/// Summarize records that are already in descending count order.
///
/// GROUP BY count ORDER BY count DESC LIMIT 5; members of a group are listed
/// by key.
pub fn summarize(sorted: &[CellRecord]) -> Result<Vec<SummaryLine>> {
    let mut buckets: Vec<Vec<&CellRecord>> = Vec::with_capacity(MAX_GROUPS);
    for record in sorted {
        match buckets.last_mut() {
            Some(bucket) if bucket.first().map(|r| r.count) == Some(record.count) => {
                bucket.push(record);
            }
            _ => {
                if buckets.len() >= MAX_GROUPS {
                    break;
                }
                buckets.push(vec![record]);
            }
        }
    }

    buckets
        .into_iter()
        .map(|mut bucket| {
            bucket.sort_by(|a, b| a.key.cmp(&b.key));
            let first = bucket
                .first()
                .ok_or_else(|| CrontentionError::Invariant("empty contention bucket".into()))?;
            Ok(SummaryLine {
                count: first.count,
                keys: bucket
                    .iter()
                    .take(MAX_KEYS_PER_GROUP)
                    .map(|r| r.key.clone())
                    .collect(),
                truncated: bucket.len() > MAX_KEYS_PER_GROUP,
            })
        })
        .collect()
}
