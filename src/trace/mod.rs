pub mod interaction;
pub mod logger;
pub mod trace;

pub use interaction::{ActionPayload, ActionType, Interaction};
pub use logger::TraceLogger;
pub use trace::{ModelObserver, Trace, TraceId};
