use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{CommandPredictor, Overlay, Predictor, UnavailablePredictor};
use crate::{log_error, log_warn};
use crate::models::Recording;
use crate::settings::LabelingSettings;

const ENABLE_LOGS: bool = true;

/// Runs predictions off the caller's thread. Prediction never reads or
/// writes labels, so no locking against the session is needed.
#[derive(Clone)]
pub struct PredictionController {
    predictor: Arc<dyn Predictor>,
}

impl PredictionController {
    pub fn new(predictor: Arc<dyn Predictor>) -> Self {
        Self { predictor }
    }

    pub fn from_settings(settings: &LabelingSettings) -> Self {
        let predictor: Arc<dyn Predictor> = match settings
            .predictor_command
            .as_deref()
            .and_then(CommandPredictor::new)
        {
            Some(command) => Arc::new(command),
            None => Arc::new(UnavailablePredictor),
        };
        Self::new(predictor)
    }

    /// Spawn a blocking prediction for a copy of `recording`.
    /// Resolves to `None` when the model fails.
    pub fn spawn(&self, recording: &Recording) -> JoinHandle<Option<Overlay>> {
        let predictor = Arc::clone(&self.predictor);
        let mut recording = recording.clone();

        tokio::task::spawn_blocking(move || {
            recording.sort_by_time();
            match predictor.predict(&recording.samples) {
                Ok(scores) => Some(Overlay {
                    recording_key: recording.key(),
                    identity: recording.identity.clone(),
                    scores,
                }),
                Err(err) => {
                    log_warn!("Prediction for {} failed: {err}", recording.identity);
                    None
                }
            }
        })
    }

    /// Spawn and wait, folding a panicked task into "no overlay".
    pub async fn predict(&self, recording: &Recording) -> Option<Overlay> {
        match self.spawn(recording).await {
            Ok(overlay) => overlay,
            Err(join_err) => {
                log_error!("Prediction task failed to join: {join_err}");
                None
            }
        }
    }
}
