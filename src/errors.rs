use thiserror::Error;

/// Errors surfaced by labeling operations. All of them are reported to the
/// user and none of them leave the label store half-updated.
#[derive(Debug, Error)]
pub enum LabelizerError {
    #[error("label file format error at line {line}: {message}")]
    MalformedLabelFile { line: usize, message: String },

    #[error("failed to load recording: {0}")]
    RecordingLoadFailure(String),

    #[error("prediction failed: {0}")]
    PredictionFailure(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidConfigValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LabelizerError>;
