pub mod controller;
pub mod state;

pub use controller::LabelSession;
pub use state::{Annotation, RecordingSwitch, SessionState};
