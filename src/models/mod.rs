pub mod label;
pub mod recording;
pub mod time;

pub use label::{Label, LabelId, LabelKind, SplitAssignment};
pub use recording::{Recording, RecordingIdentity, Sample};
pub use time::{Instant, TimeRange};
