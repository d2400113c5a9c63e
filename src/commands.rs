//! Line-oriented command surface for driving a labeling session.
//!
//! Each command maps to one operation of the session. Errors come back as
//! plain strings for display; they never end the session.

use std::path::PathBuf;

use chrono::{NaiveTime, Utc};
use log::{error, info};

use crate::interaction::{
    Effect, ModifierKey, Modifiers, PlotPoint, PointerButton, PointerEvent, ScrollDirection,
};
use crate::models::time::{format_time_of_day, parse_time_of_day};
use crate::models::{Instant, Label, SplitAssignment};
use crate::predict::Overlay;
use crate::recording::RecordingLoader;
use crate::session::Annotation;
use crate::settings::MarginSide;
use crate::AppState;

const RECENT_LIMIT: usize = 10;

pub const HELP: &str = "\
commands:
  open <recording.csv>                      display a recording
  press <primary|secondary|tertiary> <HH:MM:SS[.f]> [value] [+shift|+control|+alt]...
  move <HH:MM:SS[.f]> [value]
  release <primary|secondary|tertiary> <HH:MM:SS[.f]> [value]
  scroll <up|down> [+shift]
  undo | cancel
  save [path] | load [path]
  labels | view | recent
  split <train|test|split>
  margin <left|right> <seconds>
  interval <on|off>
  modifier <none|shift|control|alt>
  predict
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(PathBuf),
    Press {
        button: PointerButton,
        time: NaiveTime,
        value: f64,
        modifiers: Modifiers,
    },
    Move {
        time: NaiveTime,
        value: f64,
    },
    Release {
        button: PointerButton,
        time: NaiveTime,
        value: f64,
    },
    Scroll {
        direction: ScrollDirection,
        modifiers: Modifiers,
    },
    Undo,
    Cancel,
    Save(Option<PathBuf>),
    Load(Option<PathBuf>),
    Labels,
    View,
    Recent,
    Split(SplitAssignment),
    Margin {
        side: MarginSide,
        input: String,
    },
    Interval(bool),
    Modifier(Option<ModifierKey>),
    Predict,
    Help,
    Quit,
}

fn parse_button(value: &str) -> Result<PointerButton, String> {
    match value {
        "primary" | "left" | "1" => Ok(PointerButton::Primary),
        "secondary" | "right" | "3" => Ok(PointerButton::Secondary),
        "tertiary" | "middle" | "2" => Ok(PointerButton::Tertiary),
        other => Err(format!("unknown button '{other}'")),
    }
}

fn parse_modifier_key(value: &str) -> Result<ModifierKey, String> {
    match value {
        "shift" => Ok(ModifierKey::Shift),
        "control" | "ctrl" => Ok(ModifierKey::Control),
        "alt" => Ok(ModifierKey::Alt),
        other => Err(format!("unknown modifier '{other}'")),
    }
}

fn parse_time(value: Option<&str>) -> Result<NaiveTime, String> {
    let value = value.ok_or("missing time")?;
    parse_time_of_day(value).ok_or_else(|| format!("invalid time '{value}'"))
}

/// Trailing `[value] [+modifier]...` arguments.
fn parse_tail<'a>(args: impl Iterator<Item = &'a str>) -> Result<(f64, Modifiers), String> {
    let mut value = 0.0;
    let mut modifiers = Modifiers::none();
    for arg in args {
        if let Some(key) = arg.strip_prefix('+') {
            modifiers = modifiers.with(parse_modifier_key(key)?);
        } else {
            value = arg
                .parse()
                .map_err(|_| format!("invalid value '{arg}'"))?;
        }
    }
    Ok((value, modifiers))
}

fn parse_switch(value: Option<&str>) -> Result<bool, String> {
    match value {
        Some("on") | Some("true") => Ok(true),
        Some("off") | Some("false") => Ok(false),
        other => Err(format!("expected on/off, got '{}'", other.unwrap_or(""))),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or("empty command")?;

        let command = match name {
            "open" => {
                let path = parts.next().ok_or("usage: open <recording.csv>")?;
                Command::Open(PathBuf::from(path))
            }
            "press" => {
                let button = parse_button(parts.next().ok_or("missing button")?)?;
                let time = parse_time(parts.next())?;
                let (value, modifiers) = parse_tail(parts.by_ref())?;
                Command::Press {
                    button,
                    time,
                    value,
                    modifiers,
                }
            }
            "move" => {
                let time = parse_time(parts.next())?;
                let (value, _) = parse_tail(parts.by_ref())?;
                Command::Move { time, value }
            }
            "release" => {
                let button = parse_button(parts.next().ok_or("missing button")?)?;
                let time = parse_time(parts.next())?;
                let (value, _) = parse_tail(parts.by_ref())?;
                Command::Release {
                    button,
                    time,
                    value,
                }
            }
            "scroll" => {
                let direction = match parts.next() {
                    Some("up") => ScrollDirection::Up,
                    Some("down") => ScrollDirection::Down,
                    _ => return Err("usage: scroll <up|down> [+shift]".into()),
                };
                let (_, modifiers) = parse_tail(parts.by_ref())?;
                Command::Scroll {
                    direction,
                    modifiers,
                }
            }
            "undo" => Command::Undo,
            "cancel" => Command::Cancel,
            "save" => Command::Save(parts.next().map(PathBuf::from)),
            "load" => Command::Load(parts.next().map(PathBuf::from)),
            "labels" => Command::Labels,
            "view" => Command::View,
            "recent" => Command::Recent,
            "split" => Command::Split(parts.next().unwrap_or("").parse()?),
            "margin" => {
                let side = match parts.next() {
                    Some("left") => MarginSide::Left,
                    Some("right") => MarginSide::Right,
                    _ => return Err("usage: margin <left|right> <seconds>".into()),
                };
                let input = parts.next().ok_or("missing seconds")?.to_string();
                Command::Margin { side, input }
            }
            "interval" => Command::Interval(parse_switch(parts.next())?),
            "modifier" => match parts.next() {
                Some("none") => Command::Modifier(None),
                Some(key) => Command::Modifier(Some(parse_modifier_key(key)?)),
                None => return Err("usage: modifier <none|shift|control|alt>".into()),
            },
            "predict" => Command::Predict,
            "help" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };

        Ok(command)
    }
}

fn describe_label(label: &Label) -> String {
    let end = label.end.map(format_time_of_day).unwrap_or_default();
    format!(
        "{} {} {}-{} {}",
        label.identity,
        label.kind.as_str(),
        format_time_of_day(label.start),
        end,
        label.split
    )
}

fn describe_span(annotation: &Annotation) -> String {
    format!(
        "shown {}-{}",
        format_time_of_day(annotation.span.start),
        format_time_of_day(annotation.span.end)
    )
}

fn describe_overlay(overlay: &Overlay) -> String {
    let peak = overlay
        .scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score));
    match peak {
        Some(peak) => format!(
            "overlay {} points, peak {:.3} at {}",
            overlay.scores.len(),
            peak.score,
            format_time_of_day(peak.timestamp)
        ),
        None => "overlay empty".to_string(),
    }
}

fn describe_effect(effect: &Effect) -> String {
    match effect {
        Effect::None => "ignored".to_string(),
        Effect::MarkPending { at, kind } => {
            format!("pending {} from {}", kind.as_str(), format_time_of_day(*at))
        }
        Effect::CreateLabel(label) => format!("added {}", describe_label(label)),
        Effect::BeginPan { .. } => "pan started".to_string(),
        Effect::UpdatePan { .. } => "panned".to_string(),
        Effect::EndPan => "pan ended".to_string(),
        Effect::Zoom { axis, factor } => format!("zoomed {axis:?} by {factor}"),
    }
}

impl AppState {
    /// Typed times carry no date; overnight recordings resolve them to
    /// whichever covered day puts them inside the data.
    fn instant_on_recording(&self, time: NaiveTime) -> Result<Instant, String> {
        let recording = self
            .session
            .recording()
            .ok_or("no recording open, use 'open <file>' first")?;
        Ok(recording.instant_at(time))
    }

    fn persist_labeling_settings(&self) -> Result<(), String> {
        let mut stored = self.settings.labeling();
        let current = self.session.settings();
        stored.left_margin_secs = current.left_margin_secs;
        stored.right_margin_secs = current.right_margin_secs;
        stored.use_interval = current.use_interval;
        stored.label_modifier = current.label_modifier;
        self.settings
            .update_labeling(stored)
            .map_err(|e| e.to_string())
    }

    /// Write the displayed recording's view to the database.
    pub async fn persist_current_view(&mut self) -> Result<(), String> {
        if let Some((key, view)) = self.session.save_view() {
            self.db
                .upsert_view_state(&key, view)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    async fn open(&mut self, path: PathBuf) -> Result<String, String> {
        // A failed load leaves the displayed recording in place.
        let recording = RecordingLoader::load(&path).map_err(|e| e.to_string())?;
        let key = recording.key();
        let identity = recording.identity.clone();

        let switch = self.session.open_recording(recording);
        if let Some((outgoing_key, view)) = switch.outgoing {
            if let Err(err) = self.db.upsert_view_state(&outgoing_key, view).await {
                error!("Failed to persist view for {outgoing_key}: {err}");
            }
        }
        if let Err(err) = self
            .db
            .record_recording_opened(&key, &identity, Utc::now())
            .await
        {
            error!("Failed to record recent recording {key}: {err}");
        }

        let mut reply = format!(
            "opened {identity} ({} labels, view {})",
            self.session.visible_labels().len(),
            if switch.restored_view { "restored" } else { "fitted" }
        );
        if let Some((start, kind)) = switch.abandoned {
            reply.push_str(&format!(
                "; dropped pending {} from {}",
                kind.as_str(),
                format_time_of_day(start)
            ));
        }
        Ok(reply)
    }

    /// Run one command. `Quit` is handled by the caller.
    pub async fn execute(&mut self, command: Command) -> Result<String, String> {
        match command {
            Command::Open(path) => self.open(path).await,
            Command::Press {
                button,
                time,
                value,
                modifiers,
            } => {
                let at = PlotPoint::new(self.instant_on_recording(time)?, value);
                let effect = self.session.handle_pointer(&PointerEvent::Press {
                    button,
                    at,
                    modifiers,
                });
                Ok(describe_effect(&effect))
            }
            Command::Move { time, value } => {
                let at = PlotPoint::new(self.instant_on_recording(time)?, value);
                let effect = self.session.handle_pointer(&PointerEvent::Move { at });
                Ok(describe_effect(&effect))
            }
            Command::Release {
                button,
                time,
                value,
            } => {
                let at = PlotPoint::new(self.instant_on_recording(time)?, value);
                let effect = self
                    .session
                    .handle_pointer(&PointerEvent::Release { button, at });
                Ok(describe_effect(&effect))
            }
            Command::Scroll {
                direction,
                modifiers,
            } => {
                let effect = self.session.handle_pointer(&PointerEvent::Scroll {
                    direction,
                    modifiers,
                });
                Ok(describe_effect(&effect))
            }
            Command::Undo => Ok(match self.session.undo() {
                Some(label) => format!("removed {}", describe_label(&label)),
                None => "nothing to undo".to_string(),
            }),
            Command::Cancel => Ok(if self.session.cancel_pending() {
                "pending interval dropped".to_string()
            } else {
                "nothing pending".to_string()
            }),
            Command::Save(path) => {
                let path = path.unwrap_or_else(|| self.session.settings().labels_path.clone());
                let count = self.session.save_labels(&path).map_err(|e| e.to_string())?;
                Ok(format!("saved {count} labels to {}", path.display()))
            }
            Command::Load(path) => {
                let path = path.unwrap_or_else(|| self.session.settings().labels_path.clone());
                let count = self.session.load_labels(&path).map_err(|e| e.to_string())?;
                Ok(format!(
                    "loaded {count} labels from {} ({} on this recording)",
                    path.display(),
                    self.session.visible_labels().len()
                ))
            }
            Command::Labels => {
                // Annotations follow the visible labels in order, then any pending start.
                let annotations = self.session.annotations();
                let mut lines: Vec<String> = self
                    .session
                    .visible_labels()
                    .into_iter()
                    .zip(&annotations)
                    .map(|(label, annotation)| {
                        format!("{} {}", describe_label(label), describe_span(annotation))
                    })
                    .collect();
                if let Some(pending) = annotations.iter().find(|a| a.pending) {
                    lines.push(format!(
                        "pending {} from {}",
                        pending.kind.as_str(),
                        format_time_of_day(pending.span.start)
                    ));
                }
                Ok(if lines.is_empty() {
                    format!("no labels ({} in total)", self.session.labels().len())
                } else {
                    lines.join("\n")
                })
            }
            Command::View => {
                let view = self.session.view().ok_or("no view")?;
                let mut reply = format!(
                    "x {} .. {}, y {:.3} .. {:.3}",
                    view.x_range.start, view.x_range.end, view.y_range.0, view.y_range.1
                );
                if let Some(overlay) = self.session.overlay() {
                    reply.push_str(&format!("; {}", describe_overlay(overlay)));
                }
                Ok(reply)
            }
            Command::Recent => {
                let recent = self
                    .db
                    .list_recent_recordings(RECENT_LIMIT)
                    .await
                    .map_err(|e| e.to_string())?;
                Ok(recent
                    .iter()
                    .map(|r| format!("{} {}", r.identity, r.recording_key))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            Command::Split(split) => {
                self.session.set_split(split);
                Ok(format!("new labels will be tagged {split}"))
            }
            Command::Margin { side, input } => {
                let secs = self
                    .session
                    .set_margin(side, &input)
                    .map_err(|e| e.to_string())?;
                self.persist_labeling_settings()?;
                Ok(format!("{side:?} margin set to {secs}s"))
            }
            Command::Interval(enabled) => {
                self.session.set_use_interval(enabled);
                self.persist_labeling_settings()?;
                Ok(format!(
                    "interval mode {}",
                    if enabled { "on" } else { "off" }
                ))
            }
            Command::Modifier(modifier) => {
                self.session.set_label_modifier(modifier);
                self.persist_labeling_settings()?;
                Ok(match modifier {
                    Some(key) => format!("labeling requires {key:?}"),
                    None => "labeling needs no modifier".to_string(),
                })
            }
            Command::Predict => {
                let recording = self
                    .session
                    .recording()
                    .ok_or("no recording open")?;
                let overlay = self.predictions.predict(recording).await;
                if self.session.set_prediction(overlay) {
                    info!("Prediction overlay ready");
                    Ok(self
                        .session
                        .overlay()
                        .map(describe_overlay)
                        .unwrap_or_else(|| "no prediction available".to_string()))
                } else {
                    Ok("no prediction available".to_string())
                }
            }
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok("bye".to_string()),
        }
    }
}
