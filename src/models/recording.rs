use std::fmt;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time::{Instant, TimeRange};

/// Identifies a sensor recording by device tag and calendar date.
/// Labels are scoped to recordings through this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingIdentity {
    pub tag: String,
    pub date: NaiveDate,
}

impl RecordingIdentity {
    pub fn new(tag: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            tag: tag.into(),
            date,
        }
    }
}

impl fmt::Display for RecordingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.tag, self.date.format("%Y-%m-%d"))
    }
}

/// One accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: Instant,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// A loaded sensor file. Samples are kept sorted by timestamp.
#[derive(Debug, Clone)]
pub struct Recording {
    pub path: PathBuf,
    pub identity: RecordingIdentity,
    pub samples: Vec<Sample>,
}

impl Recording {
    pub fn key(&self) -> String {
        self.path.display().to_string()
    }

    pub fn time_span(&self) -> Option<TimeRange> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        Some(TimeRange::ordered(first.timestamp, last.timestamp))
    }

    /// Calendar days covered by the samples. More than one when the
    /// recording runs past midnight.
    pub fn days(&self) -> Option<(NaiveDate, NaiveDate)> {
        let span = self.time_span()?;
        Some((span.start.date(), span.end.date()))
    }

    pub fn covers_day(&self, day: NaiveDate) -> bool {
        self.days()
            .is_some_and(|(first, last)| first <= day && day <= last)
    }

    /// Place a time of day on the recording's timeline: the first covered
    /// day on which it falls inside the sample span, else the identity date.
    pub fn instant_at(&self, time: NaiveTime) -> Instant {
        let fallback = self.identity.date.and_time(time);
        let (Some(span), Some((first, last))) = (self.time_span(), self.days()) else {
            return fallback;
        };
        first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| day.and_time(time))
            .find(|candidate| span.contains(*candidate))
            .unwrap_or(fallback)
    }

    /// Smallest and largest value over all three axes.
    pub fn value_span(&self) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .flat_map(|s| [s.ax, s.ay, s.az])
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Resort samples by timestamp. Stable, so equal timestamps keep file order.
    pub fn sort_by_time(&mut self) {
        self.samples.sort_by_key(|s| s.timestamp);
    }
}
