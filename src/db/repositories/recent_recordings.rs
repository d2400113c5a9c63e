use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use crate::db::{
    helpers::{parse_date, parse_datetime},
    Database,
};
use crate::models::RecordingIdentity;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentRecording {
    pub recording_key: String,
    pub identity: RecordingIdentity,
    pub opened_at: DateTime<Utc>,
}

fn row_to_recent(row: &Row) -> Result<RecentRecording> {
    let date: String = row.get("recording_date")?;
    let opened_at: String = row.get("opened_at")?;

    Ok(RecentRecording {
        recording_key: row.get("recording_key")?,
        identity: RecordingIdentity::new(
            row.get::<_, String>("tag")?,
            parse_date(&date, "recording_date")?,
        ),
        opened_at: parse_datetime(&opened_at, "opened_at")?,
    })
}

impl Database {
    pub async fn record_recording_opened(
        &self,
        recording_key: &str,
        identity: &RecordingIdentity,
        opened_at: DateTime<Utc>,
    ) -> Result<()> {
        let recording_key = recording_key.to_string();
        let identity = identity.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO recent_recordings (recording_key, tag, recording_date, opened_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(recording_key) DO UPDATE SET
                     tag = excluded.tag,
                     recording_date = excluded.recording_date,
                     opened_at = excluded.opened_at",
                params![
                    recording_key,
                    identity.tag,
                    identity.date.format("%Y-%m-%d").to_string(),
                    opened_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Most recently opened first.
    pub async fn list_recent_recordings(&self, limit: usize) -> Result<Vec<RecentRecording>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT recording_key, tag, recording_date, opened_at
                 FROM recent_recordings
                 ORDER BY opened_at DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut recent = Vec::new();
            while let Some(row) = rows.next()? {
                recent.push(row_to_recent(row)?);
            }

            Ok(recent)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use tempfile::tempdir;

    #[tokio::test]
    async fn reopening_moves_recording_to_front() {
        let dir = tempdir().unwrap();
        let db = Database::new(dir.path().join("labelizer.sqlite3")).unwrap();
        let identity = RecordingIdentity::new("A", NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        let now = Utc::now();

        db.record_recording_opened("a.csv", &identity, now).await.unwrap();
        db.record_recording_opened("b.csv", &identity, now + Duration::seconds(1))
            .await
            .unwrap();
        db.record_recording_opened("a.csv", &identity, now + Duration::seconds(2))
            .await
            .unwrap();

        let recent = db.list_recent_recordings(10).await.unwrap();
        let keys: Vec<&str> = recent.iter().map(|r| r.recording_key.as_str()).collect();
        assert_eq!(keys, vec!["a.csv", "b.csv"]);
        assert_eq!(recent[0].identity, identity);
        assert_eq!(db.list_recent_recordings(1).await.unwrap().len(), 1);
    }
}
