use std::path::Path;

use crate::errors::Result;
use crate::interaction::{Effect, ModifierKey, PointerEvent, PointerState, StepContext};
use crate::labels::{self, LabelStore};
use crate::models::{Label, Recording, RecordingIdentity, SplitAssignment, TimeRange};
use crate::predict::Overlay;
use crate::settings::{LabelingSettings, MarginSide};
use crate::view::{ViewState, ViewStateCache};
use crate::{log_info, log_warn};

use super::state::{Annotation, RecordingSwitch, SessionState};

const ENABLE_LOGS: bool = true;

/// The labeling engine: turns pointer input on the current recording into
/// labels and keeps per-recording view memory.
#[derive(Debug, Clone, Default)]
pub struct LabelSession {
    state: SessionState,
}

impl LabelSession {
    pub fn new(settings: LabelingSettings) -> Self {
        Self {
            state: SessionState::new(settings),
        }
    }

    pub fn with_views(mut self, views: ViewStateCache) -> Self {
        self.state.views = views;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn settings(&self) -> &LabelingSettings {
        &self.state.settings
    }

    pub fn labels(&self) -> &LabelStore {
        &self.state.labels
    }

    pub fn recording(&self) -> Option<&Recording> {
        self.state.recording.as_ref()
    }

    pub fn identity(&self) -> Option<&RecordingIdentity> {
        self.state.recording.as_ref().map(|r| &r.identity)
    }

    pub fn view(&self) -> Option<ViewState> {
        self.state.view
    }

    pub fn views(&self) -> &ViewStateCache {
        &self.state.views
    }

    pub fn pointer(&self) -> PointerState {
        self.state.pointer
    }

    pub fn current_split(&self) -> SplitAssignment {
        self.state.current_split
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.state.overlay.as_ref()
    }

    /// Capture the current view under the displayed recording's key.
    pub fn save_view(&mut self) -> Option<(String, ViewState)> {
        let key = self.state.recording.as_ref()?.key();
        let view = self.state.view?;
        self.state.views.save(key.clone(), view);
        Some((key, view))
    }

    /// Swap in a freshly loaded recording. The outgoing view is cached first,
    /// then the incoming one is restored or auto-fit.
    pub fn open_recording(&mut self, recording: Recording) -> RecordingSwitch {
        let outgoing = self.save_view();
        let abandoned = self.state.pointer.abandon_pending();
        self.state.pointer.pan_anchor = None;
        self.state.overlay = None;

        let restored = self.state.views.restore(&recording.key());
        let restored_view = restored.is_some();
        self.state.view = restored.or_else(|| ViewState::fit(&recording));

        log_info!(
            "Displaying {} ({} samples, {} labels, view {})",
            recording.identity,
            recording.samples.len(),
            self.state.labels.filter_for_recording(&recording).len(),
            if restored_view { "restored" } else { "fitted" }
        );
        self.state.recording = Some(recording);

        RecordingSwitch {
            outgoing,
            restored_view,
            abandoned,
        }
    }

    /// Feed one pointer event through the state machine and apply its effect.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> Effect {
        let identity = self.state.recording.as_ref().map(|r| &r.identity);
        let ctx = StepContext {
            identity,
            split: self.state.current_split,
            use_interval: self.state.settings.use_interval,
            label_modifier: self.state.settings.label_modifier,
        };
        let (next, effect) = self.state.pointer.step(event, &ctx);
        self.state.pointer = next;

        match &effect {
            Effect::CreateLabel(label) => {
                self.state.labels.append(label.clone());
            }
            Effect::UpdatePan { dx, dy } => {
                if let Some(view) = self.state.view.as_mut() {
                    view.translate(*dx, *dy);
                }
            }
            Effect::Zoom { axis, factor } => {
                if let Some(view) = self.state.view.as_mut() {
                    view.zoom(*axis, *factor);
                }
            }
            Effect::None
            | Effect::MarkPending { .. }
            | Effect::BeginPan { .. }
            | Effect::EndPan => {}
        }

        effect
    }

    pub fn undo(&mut self) -> Option<Label> {
        self.state.labels.undo()
    }

    pub fn cancel_pending(&mut self) -> bool {
        self.state.pointer.abandon_pending().is_some()
    }

    pub fn save_labels(&self, path: &Path) -> Result<usize> {
        labels::save_labels(path, self.state.labels.all())
    }

    /// Replace the store with the file's labels. On any error the store
    /// is left exactly as it was.
    pub fn load_labels(&mut self, path: &Path) -> Result<usize> {
        let loaded = match labels::load_labels(path) {
            Ok(loaded) => loaded,
            Err(err) => {
                log_warn!("Keeping {} labels, load failed: {err}", self.state.labels.len());
                return Err(err);
            }
        };
        let count = loaded.len();
        self.state.labels.replace_all(loaded);
        Ok(count)
    }

    /// Labels of the displayed recording, in creation order.
    pub fn visible_labels(&self) -> Vec<&Label> {
        match self.state.recording.as_ref() {
            Some(recording) => self.state.labels.filter_for_recording(recording),
            None => Vec::new(),
        }
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        let left = self.state.settings.left_margin();
        let right = self.state.settings.right_margin();

        let mut annotations: Vec<Annotation> = self
            .visible_labels()
            .into_iter()
            .map(|label| Annotation {
                kind: label.kind,
                span: label.display_span(left, right),
                marker: label.is_point().then_some(label.start),
                pending: false,
            })
            .collect();

        if let Some((start, kind)) = self.state.pointer.pending() {
            annotations.push(Annotation {
                kind,
                span: TimeRange::ordered(start, start),
                marker: Some(start),
                pending: true,
            });
        }
        annotations
    }

    pub fn set_split(&mut self, split: SplitAssignment) {
        self.state.current_split = split;
    }

    pub fn set_margin(&mut self, side: MarginSide, input: &str) -> Result<f64> {
        self.state.settings.set_margin(side, input)
    }

    /// Leaving interval mode drops any half-finished interval.
    pub fn set_use_interval(&mut self, use_interval: bool) {
        if !use_interval {
            self.state.pointer.abandon_pending();
        }
        self.state.settings.use_interval = use_interval;
    }

    pub fn set_label_modifier(&mut self, modifier: Option<ModifierKey>) {
        self.state.settings.label_modifier = modifier;
    }

    /// Accept an overlay only if it belongs to the displayed recording.
    pub fn set_prediction(&mut self, overlay: Option<Overlay>) -> bool {
        let Some(overlay) = overlay else {
            self.state.overlay = None;
            return false;
        };
        let current = self.state.recording.as_ref().map(|r| r.key());
        if current.as_deref() != Some(overlay.recording_key.as_str()) {
            log_warn!(
                "Dropping prediction for {}, recording was switched",
                overlay.recording_key
            );
            return false;
        }
        self.state.overlay = Some(overlay);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LabelizerError;
    use crate::interaction::{Modifiers, PlotPoint, PointerButton, ScrollDirection};
    use crate::models::{Instant, LabelKind, Sample};
    use chrono::{Duration, NaiveDate};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn at(d: u32, s: u32) -> Instant {
        day(d).and_hms_opt(10, 0, s).unwrap()
    }

    fn recording(path: &str, tag: &str, d: u32) -> Recording {
        let samples = (0..30)
            .map(|s| Sample {
                timestamp: at(d, s),
                ax: (s as f64).sin(),
                ay: 0.0,
                az: 9.8,
            })
            .collect();
        Recording {
            path: PathBuf::from(path),
            identity: RecordingIdentity::new(tag, day(d)),
            samples,
        }
    }

    fn press(button: PointerButton, time: Instant) -> PointerEvent {
        PointerEvent::Press {
            button,
            at: PlotPoint::new(time, 0.0),
            modifiers: Modifiers::none(),
        }
    }

    fn settings(use_interval: bool) -> LabelingSettings {
        LabelingSettings {
            left_margin_secs: 2.0,
            right_margin_secs: 2.0,
            use_interval,
            ..LabelingSettings::default()
        }
    }

    #[test]
    fn point_press_then_save_and_load_round_trip() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 0)));

        assert_eq!(session.labels().len(), 1);
        let label = session.labels().last().unwrap().clone();
        assert_eq!(label.start, at(14, 0));
        assert_eq!(label.end, None);
        assert_eq!(label.kind, LabelKind::Fall);
        assert_eq!(label.split, SplitAssignment::Train);

        let dir = tempdir().unwrap();
        let path = dir.path().join("falls.csv");
        session.save_labels(&path).unwrap();
        let mut fresh = LabelSession::new(settings(false));
        assert_eq!(fresh.load_labels(&path).unwrap(), 1);
        assert_eq!(fresh.labels().last(), Some(&label));
    }

    #[test]
    fn interval_presses_produce_one_ordered_label() {
        let mut session = LabelSession::new(settings(true));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 5)));
        assert!(session.labels().is_empty());
        session.handle_pointer(&press(PointerButton::Primary, at(14, 1)));

        let labels = session.visible_labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].start, at(14, 1));
        assert_eq!(labels[0].end, Some(at(14, 5)));
        assert_eq!(labels[0].kind, LabelKind::Fall);
    }

    #[test]
    fn split_change_only_affects_new_labels() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 1)));
        session.set_split(SplitAssignment::Test);
        session.handle_pointer(&press(PointerButton::Secondary, at(14, 2)));

        let splits: Vec<SplitAssignment> =
            session.visible_labels().iter().map(|l| l.split).collect();
        assert_eq!(splits, vec![SplitAssignment::Train, SplitAssignment::Test]);
    }

    #[test]
    fn switching_recordings_filters_labels_and_restores_views() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 3)));
        session.handle_pointer(&PointerEvent::Scroll {
            direction: ScrollDirection::Up,
            modifiers: Modifiers::none(),
        });
        let zoomed = session.view().unwrap();

        let switch = session.open_recording(recording("b.csv", "B", 15));
        assert_eq!(switch.outgoing, Some(("a.csv".to_string(), zoomed)));
        assert!(!switch.restored_view);
        assert!(session.visible_labels().is_empty());
        session.handle_pointer(&press(PointerButton::Secondary, at(15, 4)));

        let switch = session.open_recording(recording("a.csv", "A", 14));
        assert!(switch.restored_view);
        assert_eq!(session.view(), Some(zoomed));
        assert_eq!(session.visible_labels().len(), 1);
        assert_eq!(session.labels().len(), 2);

        // Undo follows append order regardless of what is displayed.
        assert_eq!(session.undo().unwrap().identity.tag, "B");
    }

    #[test]
    fn switching_abandons_pending_interval() {
        let mut session = LabelSession::new(settings(true));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 3)));
        let switch = session.open_recording(recording("b.csv", "B", 15));
        assert_eq!(switch.abandoned, Some((at(14, 3), LabelKind::Fall)));

        session.handle_pointer(&press(PointerButton::Primary, at(15, 8)));
        assert!(session.labels().is_empty());
        assert!(session.pointer().pending().is_some());
    }

    #[test]
    fn annotations_widen_point_labels_and_show_pending() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 10)));
        session.set_use_interval(true);
        session.handle_pointer(&press(PointerButton::Secondary, at(14, 20)));

        let annotations = session.annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].span, TimeRange::ordered(at(14, 8), at(14, 12)));
        assert_eq!(annotations[0].marker, Some(at(14, 10)));
        assert!(annotations[1].pending);
        assert_eq!(annotations[1].kind, LabelKind::NotFall);

        session.set_use_interval(false);
        assert_eq!(session.annotations().len(), 1);
        // Margins are display-only.
        assert_eq!(session.labels().last().unwrap().end, None);
    }

    #[test]
    fn failed_load_keeps_store() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        session.handle_pointer(&press(PointerButton::Primary, at(14, 1)));

        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        fs::write(&path, "A,2024-03-14,10:00:00,,train,1\ngarbage\n").unwrap();
        assert!(matches!(
            session.load_labels(&path),
            Err(LabelizerError::MalformedLabelFile { .. })
        ));
        assert!(session.load_labels(&dir.path().join("missing.csv")).is_err());
        assert_eq!(session.labels().len(), 1);
    }

    #[test]
    fn invalid_margin_is_rejected() {
        let mut session = LabelSession::new(settings(false));
        assert!(session.set_margin(MarginSide::Right, "abc").is_err());
        assert_eq!(session.settings().right_margin(), Duration::seconds(2));
    }

    #[test]
    fn stale_prediction_is_dropped() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        let overlay = Overlay {
            recording_key: "b.csv".to_string(),
            identity: RecordingIdentity::new("B", day(15)),
            scores: Vec::new(),
        };
        assert!(!session.set_prediction(Some(overlay.clone())));
        assert!(session.overlay().is_none());

        let current = Overlay {
            recording_key: "a.csv".to_string(),
            ..overlay
        };
        assert!(session.set_prediction(Some(current)));
        assert!(session.overlay().is_some());
    }

    #[test]
    fn after_midnight_label_survives_save_and_load() {
        let start = day(14).and_hms_opt(23, 59, 50).unwrap();
        let samples = (0..=40)
            .map(|s| Sample {
                timestamp: start + Duration::seconds(s),
                ax: 0.0,
                ay: 0.0,
                az: 9.8,
            })
            .collect();
        let overnight = Recording {
            path: PathBuf::from("overnight.csv"),
            identity: RecordingIdentity::new("A", day(14)),
            samples,
        };
        let after_midnight = day(15).and_hms_opt(0, 0, 10).unwrap();

        let mut session = LabelSession::new(settings(false));
        session.open_recording(overnight.clone());
        session.handle_pointer(&press(PointerButton::Primary, after_midnight));
        assert_eq!(session.visible_labels().len(), 1);

        let dir = tempdir().unwrap();
        let path = dir.path().join("falls.csv");
        session.save_labels(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "A,2024-03-15,00:00:10,,train,1\n"
        );

        let mut fresh = LabelSession::new(settings(false));
        fresh.open_recording(overnight);
        fresh.load_labels(&path).unwrap();
        let visible = fresh.visible_labels();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].start, after_midnight);
    }

    #[test]
    fn pan_moves_view_without_labels() {
        let mut session = LabelSession::new(settings(false));
        session.open_recording(recording("a.csv", "A", 14));
        let before = session.view().unwrap();

        session.handle_pointer(&PointerEvent::Press {
            button: PointerButton::Tertiary,
            at: PlotPoint::new(at(14, 10), 0.0),
            modifiers: Modifiers::none(),
        });
        session.handle_pointer(&PointerEvent::Move {
            at: PlotPoint::new(at(14, 13), 0.0),
        });
        session.handle_pointer(&PointerEvent::Release {
            button: PointerButton::Tertiary,
            at: PlotPoint::new(at(14, 13), 0.0),
        });

        let after = session.view().unwrap();
        assert_eq!(after.x_range.start, before.x_range.start - Duration::seconds(3));
        assert!(session.labels().is_empty());
        assert!(!session.pointer().is_panning());
    }
}
