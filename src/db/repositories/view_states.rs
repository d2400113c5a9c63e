use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_instant, parse_instant},
    Database,
};
use crate::models::TimeRange;
use crate::view::ViewState;

fn row_to_view_state(row: &Row) -> Result<(String, ViewState)> {
    let key: String = row.get("recording_key")?;
    let x_start: String = row.get("x_start")?;
    let x_end: String = row.get("x_end")?;

    let view = ViewState {
        x_range: TimeRange::ordered(
            parse_instant(&x_start, "x_start")?,
            parse_instant(&x_end, "x_end")?,
        ),
        y_range: (row.get("y_min")?, row.get("y_max")?),
    };
    Ok((key, view))
}

impl Database {
    /// Insert or overwrite the saved view of one recording.
    pub async fn upsert_view_state(&self, recording_key: &str, view: ViewState) -> Result<()> {
        let recording_key = recording_key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO view_states (recording_key, x_start, x_end, y_min, y_max, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(recording_key) DO UPDATE SET
                     x_start = excluded.x_start,
                     x_end = excluded.x_end,
                     y_min = excluded.y_min,
                     y_max = excluded.y_max,
                     updated_at = excluded.updated_at",
                params![
                    recording_key,
                    format_instant(view.x_range.start),
                    format_instant(view.x_range.end),
                    view.y_range.0,
                    view.y_range.1,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_view_states(&self) -> Result<Vec<(String, ViewState)>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT recording_key, x_start, x_end, y_min, y_max
                 FROM view_states
                 ORDER BY recording_key ASC",
            )?;

            let mut rows = stmt.query([])?;
            let mut views = Vec::new();
            while let Some(row) = rows.next()? {
                views.push(row_to_view_state(row)?);
            }

            Ok(views)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn view(lo: f64) -> ViewState {
        let day = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        ViewState {
            x_range: TimeRange::ordered(
                day.and_hms_opt(10, 0, 0).unwrap(),
                day.and_hms_micro_opt(10, 0, 30, 500).unwrap(),
            ),
            y_range: (lo, 12.5),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_and_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("labelizer.sqlite3");

        {
            let db = Database::new(path.clone()).unwrap();
            db.upsert_view_state("a.csv", view(-1.0)).await.unwrap();
            db.upsert_view_state("a.csv", view(-3.0)).await.unwrap();
            db.upsert_view_state("b.csv", view(0.0)).await.unwrap();
        }

        let db = Database::new(path).unwrap();
        let views = db.get_view_states().await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0], ("a.csv".to_string(), view(-3.0)));
    }
}
