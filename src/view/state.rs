use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::interaction::Axis;
use crate::models::{Recording, TimeRange};

/// Fraction of the data span added on each side when fitting.
const FIT_PADDING: f64 = 0.05;

/// Visible ranges of the plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub x_range: TimeRange,
    pub y_range: (f64, f64),
}

impl ViewState {
    /// Auto-fit to the whole recording, `None` for an empty one.
    pub fn fit(recording: &Recording) -> Option<Self> {
        let time = recording.time_span()?;
        let (lo, hi) = recording.value_span()?;

        let x_pad = time.duration() / 20;
        let x_pad = if x_pad.is_zero() {
            Duration::seconds(1)
        } else {
            x_pad
        };
        let y_pad = if hi > lo { (hi - lo) * FIT_PADDING } else { 1.0 };

        Some(Self {
            x_range: TimeRange::ordered(time.start - x_pad, time.end + x_pad),
            y_range: (lo - y_pad, hi + y_pad),
        })
    }

    /// Move the visible window opposite to the cursor drag so the grabbed
    /// point stays under the cursor.
    pub fn translate(&mut self, dx: Duration, dy: f64) {
        self.x_range = self.x_range.shifted(-dx);
        self.y_range = (self.y_range.0 - dy, self.y_range.1 - dy);
    }

    pub fn zoom(&mut self, axis: Axis, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        match axis {
            Axis::Time => self.x_range = self.x_range.scaled(factor),
            Axis::Value => {
                let (lo, hi) = self.y_range;
                let center = (lo + hi) / 2.0;
                let half = (hi - lo) * factor / 2.0;
                self.y_range = (center - half, center + half);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Instant, RecordingIdentity, Sample};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn at(s: u32) -> Instant {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, s)
            .unwrap()
    }

    fn recording() -> Recording {
        let sample = |s, v| Sample {
            timestamp: at(s),
            ax: v,
            ay: 0.0,
            az: -v,
        };
        Recording {
            path: PathBuf::from("a.csv"),
            identity: RecordingIdentity::new("A", at(0).date()),
            samples: vec![sample(0, 1.0), sample(20, 4.0)],
        }
    }

    #[test]
    fn fit_pads_both_axes() {
        let view = ViewState::fit(&recording()).unwrap();
        assert_eq!(view.x_range.start, at(0) - Duration::seconds(1));
        assert_eq!(view.x_range.end, at(20) + Duration::seconds(1));
        assert!((view.y_range.0 - -4.4).abs() < 1e-9);
        assert!((view.y_range.1 - 4.4).abs() < 1e-9);
    }

    #[test]
    fn translate_moves_against_drag() {
        let mut view = ViewState::fit(&recording()).unwrap();
        let before = view;
        view.translate(Duration::seconds(2), 1.0);
        assert_eq!(view.x_range.start, before.x_range.start - Duration::seconds(2));
        assert!((view.y_range.1 - (before.y_range.1 - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn zoom_value_axis_about_center() {
        let mut view = ViewState::fit(&recording()).unwrap();
        view.zoom(Axis::Value, 0.5);
        assert!((view.y_range.0 - -2.2).abs() < 1e-9);
        assert!((view.y_range.1 - 2.2).abs() < 1e-9);
        let x_before = view.x_range;
        view.zoom(Axis::Time, -1.0);
        assert_eq!(view.x_range, x_before);
    }
}
