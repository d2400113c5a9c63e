use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use csv::{ReaderBuilder, Trim, WriterBuilder};

use super::{Predictor, Score};
use crate::errors::{LabelizerError, Result};
use crate::models::time::{epoch_secs, instant_from_epoch_secs};
use crate::models::Sample;

/// Runs a model as a child process.
///
/// Samples go to stdin as `epoch_seconds,ax,ay,az` rows under a header;
/// the process answers on stdout with `epoch_seconds,score` rows.
pub struct CommandPredictor {
    program: String,
    args: Vec<String>,
}

fn failure(message: impl Into<String>) -> LabelizerError {
    LabelizerError::PredictionFailure(message.into())
}

impl CommandPredictor {
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn encode_samples(samples: &[Sample]) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(["TS", "AX", "AY", "AZ"])?;
        for sample in samples {
            writer.write_record([
                format!("{:.6}", epoch_secs(sample.timestamp)),
                sample.ax.to_string(),
                sample.ay.to_string(),
                sample.az.to_string(),
            ])?;
        }
        writer
            .into_inner()
            .map_err(|e| failure(format!("failed to buffer samples: {e}")))
    }

    fn decode_scores(output: &[u8]) -> Result<Vec<Score>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(output);

        let mut scores = Vec::new();
        for result in reader.records() {
            let record = result?;
            if record.len() < 2 {
                return Err(failure(format!("expected 2 columns, found {}", record.len())));
            }
            // Tolerate a header row.
            let Ok(secs) = record[0].parse::<f64>() else {
                if scores.is_empty() {
                    continue;
                }
                return Err(failure(format!("invalid timestamp '{}'", &record[0])));
            };
            let timestamp = instant_from_epoch_secs(secs)
                .ok_or_else(|| failure(format!("timestamp {secs} out of range")))?;
            let score = record[1]
                .parse::<f64>()
                .map_err(|e| failure(format!("invalid score '{}': {e}", &record[1])))?;
            scores.push(Score { timestamp, score });
        }
        Ok(scores)
    }
}

impl Predictor for CommandPredictor {
    fn predict(&self, samples: &[Sample]) -> Result<Vec<Score>> {
        let input = Self::encode_samples(samples)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failure(format!("failed to start '{}': {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| failure("child stdin unavailable"))?;
        // Feed stdin from another thread so a chatty child cannot deadlock us.
        let writer = thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|e| failure(format!("failed to wait for model: {e}")))?;
        if let Ok(Err(err)) = writer.join() {
            if err.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(failure(format!("failed to send samples: {err}")));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "model exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Self::decode_scores(&output.stdout)
    }
}
