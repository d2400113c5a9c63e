use crate::log_info;
use crate::models::{Label, LabelId, Recording, RecordingIdentity};

const ENABLE_LOGS: bool = false;

#[derive(Debug, Clone)]
struct StoredLabel {
    id: LabelId,
    label: Label,
}

/// Labels in creation order. Append-only apart from `undo`, which pops the
/// most recent append. Overlapping labels are allowed.
#[derive(Debug, Clone, Default)]
pub struct LabelStore {
    entries: Vec<StoredLabel>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, label: Label) -> LabelId {
        let id = LabelId::new();
        log_info!(
            "Label {} appended: {} {} at {}",
            id,
            label.identity,
            label.kind.as_str(),
            label.start
        );
        self.entries.push(StoredLabel { id, label });
        id
    }

    /// Removes and returns the latest append. Repeated calls keep popping.
    pub fn undo(&mut self) -> Option<Label> {
        let removed = self.entries.pop()?;
        log_info!("Label {} undone", removed.id);
        Some(removed.label)
    }

    /// Labels of one recording, in insertion order.
    pub fn filter_for(&self, identity: &RecordingIdentity) -> Vec<&Label> {
        self.entries
            .iter()
            .map(|entry| &entry.label)
            .filter(|label| &label.identity == identity)
            .collect()
    }

    /// Labels drawn on a loaded recording. A recording that runs past
    /// midnight also owns same-tag labels dated on any day it covers, which
    /// is how after-midnight labels come back from the label file.
    pub fn filter_for_recording(&self, recording: &Recording) -> Vec<&Label> {
        self.entries
            .iter()
            .map(|entry| &entry.label)
            .filter(|label| {
                label.identity == recording.identity
                    || (label.identity.tag == recording.identity.tag
                        && (recording.covers_day(label.identity.date)
                            || recording.covers_day(label.start.date())))
            })
            .collect()
    }

    pub fn all(&self) -> Vec<&Label> {
        self.entries.iter().map(|entry| &entry.label).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &Label)> {
        self.entries.iter().map(|entry| (entry.id, &entry.label))
    }

    /// Discards the previous contents entirely.
    pub fn replace_all(&mut self, labels: Vec<Label>) {
        self.entries = labels
            .into_iter()
            .map(|label| StoredLabel {
                id: LabelId::new(),
                label,
            })
            .collect();
    }

    pub fn last(&self) -> Option<&Label> {
        self.entries.last().map(|entry| &entry.label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
