//! Axis tick labels relative to a chosen time zone.
//!
//! The grid is laid out in UTC. A tick's label is what the clock reads in the
//! selected zone at the reference date's UTC midnight plus the tick's minutes
//! (minute axis) or hours (hour axis). Zones with fractional offsets therefore
//! shift minute labels too.

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::record::{HOURS_PER_DAY, MINUTES_PER_HOUR};

/// Minute axis shows every fifth minute.
pub const MINUTE_TICK_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    Minute,
    Hour,
}

impl Axis {
    pub fn ticks(self) -> Vec<u8> {
        match self {
            Axis::Minute => (0..MINUTES_PER_HOUR).step_by(MINUTE_TICK_STEP as usize).collect(),
            Axis::Hour => (0..HOURS_PER_DAY).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTick {
    /// Grid position.
    pub value: u8,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub minutes: Vec<AxisTick>,
    pub hours: Vec<AxisTick>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisFormatter {
    reference: NaiveDate,
    zone: Tz,
}

impl AxisFormatter {
    pub fn new(reference: NaiveDate, zone: Tz) -> Self {
        Self { reference, zone }
    }

    /// Formatter for the date typed into the form; anything that is not a
    /// `YYYY-MM-DD` date (including "today") means today.
    pub fn for_date_text(text: &str, zone: Tz) -> Self {
        Self::new(reference_date(text, Utc::now().date_naive()), zone)
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn with_zone(&self, zone: Tz) -> Self {
        Self { zone, ..self.clone() }
    }

    /// Two-digit label for `tick` on `axis`.
    pub fn label(&self, axis: Axis, tick: u8) -> String {
        let instant = self.tick_instant(axis, tick).with_timezone(&self.zone);
        let field = match axis {
            Axis::Minute => instant.minute(),
            Axis::Hour => instant.hour(),
        };
        format!("{:02}", field)
    }

    fn tick_instant(&self, axis: Axis, tick: u8) -> DateTime<Utc> {
        let midnight = self.reference.and_time(chrono::NaiveTime::MIN).and_utc();
        let offset = match axis {
            Axis::Minute => Duration::minutes(tick as i64),
            Axis::Hour => Duration::hours(tick as i64),
        };
        midnight + offset
    }

    pub fn ticks(&self, axis: Axis) -> Vec<AxisTick> {
        axis.ticks()
            .into_iter()
            .map(|value| AxisTick {
                value,
                label: self.label(axis, value),
            })
            .collect()
    }

    pub fn labels(&self) -> AxisLabels {
        AxisLabels {
            minutes: self.ticks(Axis::Minute),
            hours: self.ticks(Axis::Hour),
        }
    }
}

/// Parse `YYYY-MM-DD`, otherwise `today`. Never fails.
pub fn reference_date(text: &str, today: NaiveDate) -> NaiveDate {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").unwrap_or(today)
}
