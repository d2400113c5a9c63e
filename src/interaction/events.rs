use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::models::{Instant, Label, LabelKind};

/// A position on the plot in data coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotPoint {
    pub time: Instant,
    pub value: f64,
}

impl PlotPoint {
    pub fn new(time: Instant, value: f64) -> Self {
        Self { time, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Primary,
    Secondary,
    Tertiary,
}

impl PointerButton {
    /// Kind of label a press of this button creates, if any.
    pub fn label_kind(&self) -> Option<LabelKind> {
        match self {
            PointerButton::Primary => Some(LabelKind::Fall),
            PointerButton::Secondary => Some(LabelKind::NotFall),
            PointerButton::Tertiary => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: ModifierKey) -> Self {
        match key {
            ModifierKey::Shift => self.shift = true,
            ModifierKey::Control => self.control = true,
            ModifierKey::Alt => self.alt = true,
        }
        self
    }

    pub fn is_held(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Control => self.control,
            ModifierKey::Alt => self.alt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn zoom_factor(&self) -> f64 {
        match self {
            ScrollDirection::Up => 0.9,
            ScrollDirection::Down => 1.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Time,
    Value,
}

/// Input already mapped into plot coordinates. Events outside the plot area
/// are dropped by the shell before they get here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press {
        button: PointerButton,
        at: PlotPoint,
        modifiers: Modifiers,
    },
    Move {
        at: PlotPoint,
    },
    Release {
        button: PointerButton,
        at: PlotPoint,
    },
    Scroll {
        direction: ScrollDirection,
        modifiers: Modifiers,
    },
}

/// What the view layer should do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    MarkPending { at: Instant, kind: LabelKind },
    CreateLabel(Label),
    BeginPan { at: PlotPoint },
    UpdatePan { dx: Duration, dy: f64 },
    EndPan,
    Zoom { axis: Axis, factor: f64 },
}
