use serde::{Deserialize, Serialize};

use super::events::{Axis, Effect, ModifierKey, Modifiers, PlotPoint, PointerButton, PointerEvent};
use crate::models::time::truncate_to_micros;
use crate::models::{Instant, Label, LabelKind, RecordingIdentity, SplitAssignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum InteractionState {
    #[default]
    Idle,
    AwaitingIntervalEnd {
        pending_start: Instant,
        kind: LabelKind,
    },
}

/// Session values a step needs to read.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub identity: Option<&'a RecordingIdentity>,
    pub split: SplitAssignment,
    pub use_interval: bool,
    pub label_modifier: Option<ModifierKey>,
}

impl StepContext<'_> {
    fn modifier_satisfied(&self, event_modifiers: &Modifiers) -> bool {
        match self.label_modifier {
            Some(key) => event_modifiers.is_held(key),
            None => true,
        }
    }
}

/// Labeling selection plus the pan gesture in progress, if any.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub selection: InteractionState,
    pub pan_anchor: Option<PlotPoint>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    pub fn pending(&self) -> Option<(Instant, LabelKind)> {
        match self.selection {
            InteractionState::Idle => None,
            InteractionState::AwaitingIntervalEnd {
                pending_start,
                kind,
            } => Some((pending_start, kind)),
        }
    }

    /// Drop a half-finished interval.
    pub fn abandon_pending(&mut self) -> Option<(Instant, LabelKind)> {
        let pending = self.pending();
        self.selection = InteractionState::Idle;
        pending
    }

    /// Pure transition. Labels are only described by the returned effect;
    /// appending them is up to the caller.
    pub fn step(self, event: &PointerEvent, ctx: &StepContext<'_>) -> (PointerState, Effect) {
        match *event {
            PointerEvent::Press {
                button: PointerButton::Tertiary,
                at,
                ..
            } => (
                PointerState {
                    pan_anchor: Some(at),
                    ..self
                },
                Effect::BeginPan { at },
            ),
            PointerEvent::Press {
                button,
                at,
                modifiers,
            } => {
                let Some(kind) = button.label_kind() else {
                    return (self, Effect::None);
                };
                if !ctx.modifier_satisfied(&modifiers) {
                    return (self, Effect::None);
                }
                let Some(identity) = ctx.identity else {
                    return (self, Effect::None);
                };
                let clicked = truncate_to_micros(at.time);

                if !ctx.use_interval {
                    let label = Label::point(identity.clone(), clicked, kind, ctx.split);
                    return (
                        PointerState {
                            selection: InteractionState::Idle,
                            ..self
                        },
                        Effect::CreateLabel(label),
                    );
                }

                match self.selection {
                    InteractionState::Idle => (
                        PointerState {
                            selection: InteractionState::AwaitingIntervalEnd {
                                pending_start: clicked,
                                kind,
                            },
                            ..self
                        },
                        Effect::MarkPending { at: clicked, kind },
                    ),
                    InteractionState::AwaitingIntervalEnd {
                        pending_start,
                        kind: pending_kind,
                    } if pending_kind == kind => {
                        let label =
                            Label::interval(identity.clone(), pending_start, clicked, kind, ctx.split);
                        (
                            PointerState {
                                selection: InteractionState::Idle,
                                ..self
                            },
                            Effect::CreateLabel(label),
                        )
                    }
                    // Opposite button while an interval is open: ignored, the pending start stays.
                    InteractionState::AwaitingIntervalEnd { .. } => (self, Effect::None),
                }
            }
            PointerEvent::Move { at } => match self.pan_anchor {
                Some(anchor) => (
                    self,
                    Effect::UpdatePan {
                        dx: at.time - anchor.time,
                        dy: at.value - anchor.value,
                    },
                ),
                None => (self, Effect::None),
            },
            PointerEvent::Release {
                button: PointerButton::Tertiary,
                ..
            } if self.is_panning() => (
                PointerState {
                    pan_anchor: None,
                    ..self
                },
                Effect::EndPan,
            ),
            PointerEvent::Release { .. } => (self, Effect::None),
            PointerEvent::Scroll {
                direction,
                modifiers,
            } => {
                let axis = if modifiers.shift { Axis::Time } else { Axis::Value };
                (
                    self,
                    Effect::Zoom {
                        axis,
                        factor: direction.zoom_factor(),
                    },
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{Modifiers, ScrollDirection};
    use chrono::{Duration, NaiveDate};

    fn identity() -> RecordingIdentity {
        RecordingIdentity::new("A", NaiveDate::from_ymd_opt(2024, 3, 14).unwrap())
    }

    fn at(s: u32) -> PlotPoint {
        let time = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(10, 0, s)
            .unwrap();
        PlotPoint::new(time, 1.0)
    }

    fn press(button: PointerButton, s: u32) -> PointerEvent {
        PointerEvent::Press {
            button,
            at: at(s),
            modifiers: Modifiers::none(),
        }
    }

    fn ctx(identity: &RecordingIdentity, use_interval: bool) -> StepContext<'_> {
        StepContext {
            identity: Some(identity),
            split: SplitAssignment::Train,
            use_interval,
            label_modifier: None,
        }
    }

    fn created(effect: Effect) -> Label {
        match effect {
            Effect::CreateLabel(label) => label,
            other => panic!("expected a label, got {other:?}"),
        }
    }

    #[test]
    fn point_mode_creates_label_per_press() {
        let id = identity();
        let ctx = ctx(&id, false);
        let (state, effect) = PointerState::new().step(&press(PointerButton::Primary, 0), &ctx);
        let label = created(effect);
        assert_eq!(label.start, at(0).time);
        assert_eq!(label.end, None);
        assert_eq!(label.kind, LabelKind::Fall);
        assert_eq!(state.selection, InteractionState::Idle);

        let (state, effect) = state.step(&press(PointerButton::Secondary, 3), &ctx);
        assert_eq!(created(effect).kind, LabelKind::NotFall);
        assert_eq!(state.selection, InteractionState::Idle);
    }

    #[test]
    fn interval_mode_orders_endpoints() {
        let id = identity();
        let ctx = ctx(&id, true);
        let (state, effect) = PointerState::new().step(&press(PointerButton::Primary, 5), &ctx);
        assert_eq!(
            effect,
            Effect::MarkPending {
                at: at(5).time,
                kind: LabelKind::Fall
            }
        );
        assert_eq!(state.pending(), Some((at(5).time, LabelKind::Fall)));

        let (state, effect) = state.step(&press(PointerButton::Primary, 1), &ctx);
        let label = created(effect);
        assert_eq!(label.start, at(1).time);
        assert_eq!(label.end, Some(at(5).time));
        assert_eq!(state.selection, InteractionState::Idle);
    }

    #[test]
    fn mismatched_button_keeps_pending_interval() {
        let id = identity();
        let ctx = ctx(&id, true);
        let (state, _) = PointerState::new().step(&press(PointerButton::Primary, 2), &ctx);
        let (state, effect) = state.step(&press(PointerButton::Secondary, 4), &ctx);
        assert_eq!(effect, Effect::None);
        assert_eq!(state.pending(), Some((at(2).time, LabelKind::Fall)));

        let (_, effect) = state.step(&press(PointerButton::Primary, 4), &ctx);
        assert_eq!(created(effect).end, Some(at(4).time));
    }

    #[test]
    fn secondary_interval_is_not_fall() {
        let id = identity();
        let ctx = ctx(&id, true);
        let (state, _) = PointerState::new().step(&press(PointerButton::Secondary, 7), &ctx);
        let (_, effect) = state.step(&press(PointerButton::Secondary, 9), &ctx);
        let label = created(effect);
        assert_eq!(label.kind, LabelKind::NotFall);
        assert_eq!((label.start, label.end), (at(7).time, Some(at(9).time)));
    }

    #[test]
    fn required_modifier_gates_labeling() {
        let id = identity();
        let ctx = StepContext {
            label_modifier: Some(ModifierKey::Control),
            ..ctx(&id, false)
        };
        let (state, effect) = PointerState::new().step(&press(PointerButton::Primary, 0), &ctx);
        assert_eq!(effect, Effect::None);

        let held = PointerEvent::Press {
            button: PointerButton::Primary,
            at: at(0),
            modifiers: Modifiers::none().with(ModifierKey::Control),
        };
        let (_, effect) = state.step(&held, &ctx);
        assert!(matches!(effect, Effect::CreateLabel(_)));
    }

    #[test]
    fn no_recording_means_no_label() {
        let ctx = StepContext {
            identity: None,
            split: SplitAssignment::Test,
            use_interval: false,
            label_modifier: None,
        };
        let (_, effect) = PointerState::new().step(&press(PointerButton::Primary, 0), &ctx);
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn tertiary_drag_pans_without_touching_selection() {
        let id = identity();
        let ctx = ctx(&id, true);
        let (state, _) = PointerState::new().step(&press(PointerButton::Primary, 1), &ctx);
        let (state, effect) = state.step(&press(PointerButton::Tertiary, 10), &ctx);
        assert_eq!(effect, Effect::BeginPan { at: at(10) });

        let moved = PlotPoint::new(at(12).time, 3.0);
        let (state, effect) = state.step(&PointerEvent::Move { at: moved }, &ctx);
        assert_eq!(
            effect,
            Effect::UpdatePan {
                dx: Duration::seconds(2),
                dy: 2.0
            }
        );

        let release = PointerEvent::Release {
            button: PointerButton::Tertiary,
            at: moved,
        };
        let (state, effect) = state.step(&release, &ctx);
        assert_eq!(effect, Effect::EndPan);
        assert!(!state.is_panning());
        assert_eq!(state.pending(), Some((at(1).time, LabelKind::Fall)));

        let (_, effect) = state.step(&PointerEvent::Move { at: moved }, &ctx);
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn scroll_zooms_axis_by_shift() {
        let id = identity();
        let ctx = ctx(&id, false);
        let scroll = PointerEvent::Scroll {
            direction: ScrollDirection::Up,
            modifiers: Modifiers::none().with(ModifierKey::Shift),
        };
        let (_, effect) = PointerState::new().step(&scroll, &ctx);
        assert_eq!(
            effect,
            Effect::Zoom {
                axis: Axis::Time,
                factor: 0.9
            }
        );
    }
}
