//! Rebuilds an exploration model (states, widgets, and the interactions
//! between them) from the trace and state files of a UI-exploration run.
//!
//! ```no_run
//! use exploration_model::loading::{LoadOptions, ModelConfig, ModelParser};
//!
//! # async fn run() -> Result<(), exploration_model::loading::LoadError> {
//! let config = ModelConfig::new("model/sampleApp");
//! let model = ModelParser::load(&config, LoadOptions::parallel()).await?;
//! println!("{} states", model.state_count());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod graph;
pub mod loading;
pub mod state;
pub mod trace;

pub use graph::{GraphSummary, ModelGraph};
pub use loading::{LoadError, LoadOptions, LoadedModel, ModelConfig, ModelParser};
pub use state::{ConcreteId, State, Widget};
pub use trace::{Interaction, ModelObserver, Trace, TraceId};
