//! Label data models.
//!
//! A label marks either a single instant (point-stamped) or an explicit
//! interval of a recording as a fall or not a fall.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recording::RecordingIdentity;
use super::time::{Instant, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelId(pub Uuid);

impl LabelId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LabelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Fall,
    NotFall,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Fall => "fall",
            LabelKind::NotFall => "not_fall",
        }
    }

    /// Value of the `fall_status` column.
    pub fn fall_status(&self) -> u8 {
        match self {
            LabelKind::Fall => 1,
            LabelKind::NotFall => 0,
        }
    }

    pub fn from_fall_status(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(LabelKind::Fall),
            "0" => Some(LabelKind::NotFall),
            _ => None,
        }
    }
}

/// How a label is meant to be used downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitAssignment {
    #[default]
    Train,
    Test,
    Split,
}

impl SplitAssignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitAssignment::Train => "train",
            SplitAssignment::Test => "test",
            SplitAssignment::Split => "split",
        }
    }
}

impl fmt::Display for SplitAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitAssignment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "train" => Ok(SplitAssignment::Train),
            "test" => Ok(SplitAssignment::Test),
            "split" => Ok(SplitAssignment::Split),
            other => Err(format!("unknown split '{other}'")),
        }
    }
}

/// Immutable once created. `end` is `None` for point-stamped labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub identity: RecordingIdentity,
    pub start: Instant,
    pub end: Option<Instant>,
    pub kind: LabelKind,
    pub split: SplitAssignment,
}

impl Label {
    pub fn point(
        identity: RecordingIdentity,
        at: Instant,
        kind: LabelKind,
        split: SplitAssignment,
    ) -> Self {
        Self {
            identity,
            start: at,
            end: None,
            kind,
            split,
        }
    }

    /// Builds an interval label, ordering the two instants.
    pub fn interval(
        identity: RecordingIdentity,
        a: Instant,
        b: Instant,
        kind: LabelKind,
        split: SplitAssignment,
    ) -> Self {
        let range = TimeRange::ordered(a, b);
        Self {
            identity,
            start: range.start,
            end: Some(range.end),
            kind,
            split,
        }
    }

    pub fn is_point(&self) -> bool {
        self.end.is_none()
    }

    /// Span shown on the plot. Point labels are widened by the margins;
    /// the widened span is never stored.
    pub fn display_span(&self, left_margin: Duration, right_margin: Duration) -> TimeRange {
        match self.end {
            Some(end) => TimeRange::ordered(self.start, end),
            None => TimeRange::around(self.start, left_margin, right_margin),
        }
    }
}
