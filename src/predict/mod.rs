//! Bridge to the external fall-detection model.
//!
//! The model sees a time-ordered sample sequence and answers with a
//! time-aligned score sequence. Any failure means no overlay is drawn.

pub mod command;
pub mod controller;

use serde::{Deserialize, Serialize};

use crate::errors::{LabelizerError, Result};
use crate::models::{Instant, RecordingIdentity, Sample};

pub use command::CommandPredictor;
pub use controller::PredictionController;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub timestamp: Instant,
    pub score: f64,
}

/// Scores for one recording, ready to draw over its plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub recording_key: String,
    pub identity: RecordingIdentity,
    pub scores: Vec<Score>,
}

pub trait Predictor: Send + Sync {
    /// `samples` are sorted by timestamp.
    fn predict(&self, samples: &[Sample]) -> Result<Vec<Score>>;
}

/// Used when no model is configured.
pub struct UnavailablePredictor;

impl Predictor for UnavailablePredictor {
    fn predict(&self, _samples: &[Sample]) -> Result<Vec<Score>> {
        Err(LabelizerError::PredictionFailure(
            "no prediction model configured".to_string(),
        ))
    }
}
