//! Instants and closed time ranges.
//!
//! Sensor timestamps arrive as UTC epoch seconds and are kept as naive
//! date-times with microsecond resolution, matching the label file format.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

pub type Instant = NaiveDateTime;

const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";
const TIME_OF_DAY_MICROS_FORMAT: &str = "%H:%M:%S%.6f";
const TIME_OF_DAY_PARSE_FORMAT: &str = "%H:%M:%S%.f";

/// Convert epoch seconds to an instant, rounded to the microsecond.
pub fn instant_from_epoch_secs(secs: f64) -> Option<Instant> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64).map(|dt| dt.naive_utc())
}

pub fn epoch_secs(instant: Instant) -> f64 {
    instant.and_utc().timestamp_micros() as f64 / 1_000_000.0
}

/// Drop anything finer than a microsecond.
pub fn truncate_to_micros(instant: Instant) -> Instant {
    let nanos = instant.nanosecond() % 1_000;
    instant - Duration::nanoseconds(nanos as i64)
}

pub fn duration_from_secs_f64(secs: f64) -> Duration {
    Duration::microseconds((secs * 1_000_000.0).round() as i64)
}

pub fn duration_as_secs_f64(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => duration.num_milliseconds() as f64 / 1_000.0,
    }
}

/// `HH:MM:SS`, or `HH:MM:SS.ffffff` when there is a sub-second part.
pub fn format_time_of_day(instant: Instant) -> String {
    if instant.nanosecond() == 0 {
        instant.format(TIME_OF_DAY_FORMAT).to_string()
    } else {
        instant.format(TIME_OF_DAY_MICROS_FORMAT).to_string()
    }
}

pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_OF_DAY_PARSE_FORMAT).ok()
}

/// Closed range `[start, end]` with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: Instant,
    pub end: Instant,
}

impl TimeRange {
    /// Orders the two instants so the earlier one becomes `start`.
    pub fn ordered(a: Instant, b: Instant) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn around(point: Instant, left: Duration, right: Duration) -> Self {
        Self::ordered(point - left, point + right)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: Instant) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn center(&self) -> Instant {
        self.start + self.duration() / 2
    }

    pub fn shifted(&self, offset: Duration) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Scale the width about the centre.
    pub fn scaled(&self, factor: f64) -> Self {
        let half = duration_as_secs_f64(self.duration()) * factor / 2.0;
        let half = duration_from_secs_f64(half.abs());
        let center = self.center();
        Self {
            start: center - half,
            end: center + half,
        }
    }
}
