use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::errors::LabelizerError;
use crate::interaction::ModifierKey;
use crate::models::time::duration_from_secs_f64;
use crate::models::SplitAssignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginSide {
    Left,
    Right,
}

impl MarginSide {
    fn key(&self) -> &'static str {
        match self {
            MarginSide::Left => "left_margin_secs",
            MarginSide::Right => "right_margin_secs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingSettings {
    pub left_margin_secs: f64,
    pub right_margin_secs: f64,
    pub default_split: SplitAssignment,
    pub use_interval: bool,
    pub label_modifier: Option<ModifierKey>,
    pub labels_path: PathBuf,
    pub predictor_command: Option<Vec<String>>,
}

impl Default for LabelingSettings {
    fn default() -> Self {
        Self {
            left_margin_secs: 4.0,
            right_margin_secs: 4.0,
            default_split: SplitAssignment::Train,
            use_interval: false,
            label_modifier: None,
            labels_path: PathBuf::from("falls.csv"),
            predictor_command: None,
        }
    }
}

impl LabelingSettings {
    pub fn left_margin(&self) -> Duration {
        duration_from_secs_f64(self.left_margin_secs)
    }

    pub fn right_margin(&self) -> Duration {
        duration_from_secs_f64(self.right_margin_secs)
    }

    /// Apply a margin typed by the user. Rejected input leaves the old value.
    pub fn set_margin(&mut self, side: MarginSide, input: &str) -> Result<f64, LabelizerError> {
        let secs = parse_margin(input).ok_or_else(|| LabelizerError::InvalidConfigValue {
            key: side.key().to_string(),
            value: input.to_string(),
        })?;
        match side {
            MarginSide::Left => self.left_margin_secs = secs,
            MarginSide::Right => self.right_margin_secs = secs,
        }
        Ok(secs)
    }

    /// Clamp values a hand-edited file may carry.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !is_valid_margin(self.left_margin_secs) {
            self.left_margin_secs = defaults.left_margin_secs;
        }
        if !is_valid_margin(self.right_margin_secs) {
            self.right_margin_secs = defaults.right_margin_secs;
        }
        if self.predictor_command.as_ref().is_some_and(|c| c.is_empty()) {
            self.predictor_command = None;
        }
        self
    }
}

fn is_valid_margin(secs: f64) -> bool {
    secs.is_finite() && secs >= 0.0
}

fn parse_margin(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| is_valid_margin(*secs))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<LabelingSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str::<LabelingSettings>(&contents)
                .unwrap_or_default()
                .sanitized()
        } else {
            LabelingSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn labeling(&self) -> LabelingSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the stored settings and write them to disk.
    pub fn update_labeling(&self, settings: LabelingSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings.sanitized();
        self.persist(&guard)
    }

    fn persist(&self, data: &LabelingSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
