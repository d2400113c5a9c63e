pub mod events;
pub mod state;

pub use events::{
    Axis, Effect, ModifierKey, Modifiers, PlotPoint, PointerButton, PointerEvent, ScrollDirection,
};
pub use state::{InteractionState, PointerState, StepContext};
