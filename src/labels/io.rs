//! Label file reading and writing.
//!
//! One record per line, no header:
//! `tag,YYYY-MM-DD,HH:MM:SS[.ffffff],[HH:MM:SS[.ffffff]],split,fall_status`
//! The end-time slot stays empty for point-stamped labels.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::errors::{LabelizerError, Result};
use crate::log_info;
use crate::models::time::{format_time_of_day, parse_time_of_day, truncate_to_micros};
use crate::models::{Label, LabelKind, RecordingIdentity, SplitAssignment};

const ENABLE_LOGS: bool = true;
const FIELD_COUNT: usize = 6;

pub fn encode_label(label: &Label) -> [String; FIELD_COUNT] {
    [
        label.identity.tag.clone(),
        label.start.date().format("%Y-%m-%d").to_string(),
        format_time_of_day(label.start),
        label.end.map(format_time_of_day).unwrap_or_default(),
        label.split.as_str().to_string(),
        label.kind.fall_status().to_string(),
    ]
}

fn malformed(line: usize, message: impl Into<String>) -> LabelizerError {
    LabelizerError::MalformedLabelFile {
        line,
        message: message.into(),
    }
}

/// Parse one record. `line` is only used for error reporting.
pub fn decode_label(line: usize, record: &StringRecord) -> Result<Label> {
    if record.len() != FIELD_COUNT {
        return Err(malformed(
            line,
            format!("expected {FIELD_COUNT} fields, found {}", record.len()),
        ));
    }

    let tag = record[0].to_string();
    if tag.is_empty() {
        return Err(malformed(line, "empty tag"));
    }
    let date = NaiveDate::parse_from_str(&record[1], "%Y-%m-%d")
        .map_err(|e| malformed(line, format!("invalid date '{}': {e}", &record[1])))?;
    let start_time = parse_time_of_day(&record[2])
        .ok_or_else(|| malformed(line, format!("invalid start time '{}'", &record[2])))?;
    let start = truncate_to_micros(date.and_time(start_time));

    let end = if record[3].is_empty() {
        None
    } else {
        let end_time = parse_time_of_day(&record[3])
            .ok_or_else(|| malformed(line, format!("invalid end time '{}'", &record[3])))?;
        // The file only carries the start date; an earlier end time means midnight was crossed.
        let end_date = if end_time < start_time {
            date + Duration::days(1)
        } else {
            date
        };
        Some(truncate_to_micros(end_date.and_time(end_time)))
    };

    let split: SplitAssignment = record[4].parse().map_err(|e: String| malformed(line, e))?;
    let kind = LabelKind::from_fall_status(&record[5])
        .ok_or_else(|| malformed(line, format!("invalid fall status '{}'", &record[5])))?;

    Ok(Label {
        identity: RecordingIdentity::new(tag, date),
        start,
        end,
        kind,
        split,
    })
}

/// Parse a whole label file. Nothing is returned unless every line parses.
pub fn read_labels<R: std::io::Read>(reader: R) -> Result<Vec<Label>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut labels = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| malformed(index + 1, format!("CSV error: {e}")))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);
        labels.push(decode_label(line, &record)?);
    }
    Ok(labels)
}

pub fn write_labels<'a, W, I>(writer: W, labels: I) -> Result<()>
where
    W: std::io::Write,
    I: IntoIterator<Item = &'a Label>,
{
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    for label in labels {
        writer.write_record(encode_label(label))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_labels(path: &Path) -> Result<Vec<Label>> {
    let file = File::open(path)?;
    let labels = read_labels(file)?;
    log_info!("Loaded {} labels from {}", labels.len(), path.display());
    Ok(labels)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write through a sibling temp file so a failed save keeps the old file.
pub fn save_labels<'a, I>(path: &Path, labels: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Label>,
{
    let labels: Vec<&Label> = labels.into_iter().collect();
    let tmp = temp_path(path);
    let result = File::create(&tmp)
        .map_err(LabelizerError::from)
        .and_then(|file| write_labels(file, labels.iter().copied()))
        .and_then(|_| fs::rename(&tmp, path).map_err(LabelizerError::from));

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    log_info!("Saved {} labels to {}", labels.len(), path.display());
    Ok(labels.len())
}
