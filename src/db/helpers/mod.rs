use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::Instant;

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn format_instant(value: Instant) -> String {
    value.format(INSTANT_FORMAT).to_string()
}

pub fn parse_instant(value: &str, field: &str) -> Result<Instant> {
    Instant::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("failed to parse {field}"))
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn instant_text_round_trips() {
        let instant = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, 1)
            .unwrap()
            + Duration::microseconds(42);
        let text = format_instant(instant);
        assert_eq!(text, "2024-03-14T10:00:01.000042");
        assert_eq!(parse_instant(&text, "x_start").unwrap(), instant);
        assert!(parse_instant("yesterday", "x_start").is_err());
    }
}
