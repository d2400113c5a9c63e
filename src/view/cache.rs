use std::collections::HashMap;

use super::state::ViewState;

/// Last view of each recording, keyed by file path.
#[derive(Debug, Clone, Default)]
pub struct ViewStateCache {
    entries: HashMap<String, ViewState>,
}

impl ViewStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any earlier entry for `key`.
    pub fn save(&mut self, key: impl Into<String>, view: ViewState) {
        self.entries.insert(key.into(), view);
    }

    /// `None` means the caller should auto-fit.
    pub fn restore(&self, key: &str) -> Option<ViewState> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ViewState)> for ViewStateCache {
    fn from_iter<T: IntoIterator<Item = (String, ViewState)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
