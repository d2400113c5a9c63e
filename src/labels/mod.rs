pub mod io;
pub mod store;

pub use io::{load_labels, save_labels};
pub use store::LabelStore;
