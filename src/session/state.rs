use serde::Serialize;

use crate::interaction::PointerState;
use crate::labels::LabelStore;
use crate::models::{Instant, LabelKind, Recording, SplitAssignment, TimeRange};
use crate::predict::Overlay;
use crate::settings::LabelingSettings;
use crate::view::{ViewState, ViewStateCache};

/// Everything a labeling session mutates. Owned by one `LabelSession`
/// and only touched from the thread driving it.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub settings: LabelingSettings,
    /// Stamped onto new labels. Changing it never touches existing ones.
    pub current_split: SplitAssignment,
    pub recording: Option<Recording>,
    pub labels: LabelStore,
    pub pointer: PointerState,
    pub view: Option<ViewState>,
    pub views: ViewStateCache,
    pub overlay: Option<Overlay>,
}

impl SessionState {
    pub fn new(settings: LabelingSettings) -> Self {
        Self {
            current_split: settings.default_split,
            settings,
            ..Self::default()
        }
    }
}

/// Something to draw over the plot of the current recording.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub kind: LabelKind,
    pub span: TimeRange,
    /// Vertical line position, set for point labels and pending starts.
    pub marker: Option<Instant>,
    pub pending: bool,
}

/// Outcome of switching the displayed recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSwitch {
    /// View of the recording that was displayed before, for persistence.
    pub outgoing: Option<(String, ViewState)>,
    pub restored_view: bool,
    pub abandoned: Option<(Instant, LabelKind)>,
}
