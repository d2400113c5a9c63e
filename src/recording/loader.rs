use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::errors::{LabelizerError, Result};
use crate::log_info;
use crate::models::time::instant_from_epoch_secs;
use crate::models::{Recording, RecordingIdentity, Sample};

const ENABLE_LOGS: bool = true;

/// Parser for accelerometer CSV exports.
pub struct RecordingLoader;

fn failure(line: usize, message: impl std::fmt::Display) -> LabelizerError {
    LabelizerError::RecordingLoadFailure(format!("line {line}: {message}"))
}

fn parse_f64(value: &str, field: &str, line: usize) -> Result<f64> {
    value
        .parse()
        .map_err(|e| failure(line, format!("invalid {field} '{value}': {e}")))
}

impl RecordingLoader {
    /// Parse a recording from a CSV file.
    ///
    /// Expected format, with a header row:
    /// tag,epoch_seconds,ax,ay,az
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Recording> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            LabelizerError::RecordingLoadFailure(format!("{}: {e}", path.display()))
        })?;
        let mut recording = Self::from_reader(file)?;
        recording.path = path.to_path_buf();
        log_info!(
            "Loaded {} samples for {} from {}",
            recording.samples.len(),
            recording.identity,
            path.display()
        );
        Ok(recording)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Recording> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut tag: Option<String> = None;
        let mut samples = Vec::new();

        for (index, result) in reader.records().enumerate() {
            // +1 for the header, +1 for 1-based numbering
            let line = index + 2;
            let record = result.map_err(|e| failure(line, format!("CSV error: {e}")))?;

            if record.len() < 5 {
                return Err(failure(
                    line,
                    format!("expected 5 columns, found {}", record.len()),
                ));
            }

            match &tag {
                None => tag = Some(record[0].to_string()),
                Some(first) if first != &record[0] => {
                    return Err(failure(
                        line,
                        format!("tag '{}' differs from '{first}'", &record[0]),
                    ));
                }
                Some(_) => {}
            }

            let epoch = parse_f64(&record[1], "timestamp", line)?;
            let timestamp = instant_from_epoch_secs(epoch)
                .ok_or_else(|| failure(line, format!("timestamp {epoch} out of range")))?;

            samples.push(Sample {
                timestamp,
                ax: parse_f64(&record[2], "ax", line)?,
                ay: parse_f64(&record[3], "ay", line)?,
                az: parse_f64(&record[4], "az", line)?,
            });
        }

        let Some(tag) = tag else {
            return Err(LabelizerError::RecordingLoadFailure(
                "no samples found in file".to_string(),
            ));
        };

        // Dates are compared by calendar day, so sort before taking the first one.
        samples.sort_by_key(|s| s.timestamp);
        let date = samples[0].timestamp.date();

        Ok(Recording {
            path: Default::default(),
            identity: RecordingIdentity::new(tag, date),
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_valid_recording_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "MAC,TS,AX,AY,AZ").unwrap();
        writeln!(file, "C4:7F,1710410405.5,0.1,0.2,9.8").unwrap();
        writeln!(file, "C4:7F,1710410400,0.0,0.1,9.7").unwrap();
        file.flush().unwrap();

        let recording = RecordingLoader::load(file.path()).unwrap();
        assert_eq!(recording.samples.len(), 2);
        assert_eq!(recording.identity.tag, "C4:7F");
        assert_eq!(
            recording.identity.date,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
        assert!(recording.samples[0].timestamp < recording.samples[1].timestamp);
        assert_eq!(recording.samples[1].az, 9.8);
        assert_eq!(recording.path, file.path());
    }

    #[test]
    fn reports_line_of_bad_value() {
        let input = "MAC,TS,AX,AY,AZ\nA,1710410400,0.0,0.1,9.7\nA,1710410401,x,0.1,9.7\n";
        match RecordingLoader::from_reader(input.as_bytes()) {
            Err(LabelizerError::RecordingLoadFailure(message)) => {
                assert!(message.starts_with("line 3"), "{message}")
            }
            other => panic!("expected load failure, got {other:?}"),
        }
    }

    #[test]
    fn rejects_mixed_tags_and_empty_files() {
        let mixed = "MAC,TS,AX,AY,AZ\nA,1710410400,0,0,0\nB,1710410401,0,0,0\n";
        assert!(RecordingLoader::from_reader(mixed.as_bytes()).is_err());
        let empty = "MAC,TS,AX,AY,AZ\n";
        assert!(RecordingLoader::from_reader(empty.as_bytes()).is_err());
        assert!(RecordingLoader::load("/nonexistent/recording.csv").is_err());
    }
}
