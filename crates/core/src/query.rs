//! Form state: the query that produces a view, and its local validation.
//!
//! A query has two fields, newline-separated `expressions` and a free-text
//! `date`. It serializes the same way for the request body and for the
//! shareable location (`?expressions=…&date=…`).

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::error::Result;

pub const TODAY: &str = "today";

/// Accepted date spellings, checked after lower-casing.
const DATE_PATTERN: &str = r"^(?:today|[0-9]{4}-[0-9]{2}-[0-9]{2})$";

pub const EARLIEST_YEAR: i32 = 1970;

/// How far past the current year a date may lie.
pub const MAX_YEARS_AHEAD: i32 = 100;

/// Query parameters of one view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub expressions: String,
    pub date: String,
}

impl Query {
    pub fn new(expressions: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            expressions: expressions.into(),
            date: date.into(),
        }
    }

    /// Decode a form-urlencoded query string, with or without a leading `?`.
    /// Missing fields are empty; unknown fields are ignored.
    pub fn from_url_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parsed = Self::default();
        for (name, value) in form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "expressions" => parsed.expressions = value.into_owned(),
                "date" => parsed.date = value.into_owned(),
                _ => {}
            }
        }
        parsed
    }

    /// Decode the query part of a location such as `/?expressions=…`.
    pub fn from_location(location: &str) -> Self {
        match location.split_once('?') {
            Some((_, query)) => Self::from_url_query(query),
            None => Self::default(),
        }
    }

    /// `expressions=…&date=…`, in that order.
    pub fn to_url_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("expressions", &self.expressions)
            .append_pair("date", &self.date)
            .finish()
    }

    /// Location for this query, e.g. `?expressions=…&date=today`.
    pub fn location(&self) -> String {
        format!("?{}", self.to_url_query())
    }

    /// Request body sent to the evaluation service. An empty date is sent as
    /// `today`.
    pub fn form_body(&self) -> String {
        let date = if self.date.trim().is_empty() {
            TODAY
        } else {
            self.date.as_str()
        };
        form_urlencoded::Serializer::new(String::new())
            .append_pair("expressions", &self.expressions)
            .append_pair("date", date)
            .finish()
    }

    /// No expressions entered.
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// One entry per non-blank line, as listed after a draw.
    pub fn expression_lines(&self) -> Vec<String> {
        self.expressions
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ── Field errors ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Date,
    Expressions,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Date => f.write_str("date"),
            Field::Expressions => f.write_str("expressions"),
        }
    }
}

/// A rejected field value and why, shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub value: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: Field, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.value, self.message)
    }
}

// ── Date rule ───────────────────────────────────────────────────────

/// Local date check run before any request is issued.
#[derive(Debug, Clone)]
pub struct DateRule {
    pattern: Regex,
}

impl DateRule {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(DATE_PATTERN)?,
        })
    }

    /// Check `text` against `this_year`. Empty text means `today`.
    pub fn validate(&self, text: &str, this_year: i32) -> Result<(), FieldError> {
        let normalized = text.to_lowercase();
        let normalized = if normalized.is_empty() { TODAY } else { normalized.as_str() };

        if !self.pattern.is_match(normalized) {
            return Err(FieldError::new(
                Field::Date,
                text,
                "Expected \"today\" or ISO 8601 date: YYYY-MM-DD.",
            ));
        }
        if normalized == TODAY {
            return Ok(());
        }

        let year: i32 = normalized[..4].parse().map_err(|_| {
            FieldError::new(
                Field::Date,
                text,
                "Expected \"today\" or ISO 8601 date: YYYY-MM-DD.",
            )
        })?;
        if year < EARLIEST_YEAR {
            return Err(FieldError::new(
                Field::Date,
                text,
                format!("Must be {EARLIEST_YEAR} or later, was {year}."),
            ));
        }
        let diff = year - this_year;
        if diff > MAX_YEARS_AHEAD {
            return Err(FieldError::new(
                Field::Date,
                text,
                format!("Must not be later than {MAX_YEARS_AHEAD} years of this year, was {diff}."),
            ));
        }
        Ok(())
    }
}
