pub mod identity;
pub mod state_model;
pub mod widget;

pub use identity::{ConcreteId, FieldParseError};
pub use state_model::State;
pub use widget::{Capabilities, Rect, Widget};
