pub mod recent_recordings;
pub mod view_states;
