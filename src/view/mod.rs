pub mod cache;
pub mod state;

pub use cache::ViewStateCache;
pub use state::ViewState;
