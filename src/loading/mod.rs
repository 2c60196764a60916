pub mod action_parser;
pub mod cache;
pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod repair;
pub mod scheduler;
pub mod schema;
pub mod state_parser;

pub use action_parser::{ActionRecord, ActionRecordParser};
pub use cache::IdentityCache;
pub use config::ModelConfig;
pub use error::LoadError;
pub use parser::{LoadOptions, LoadedModel, ModelParser, RemapTable};
pub use reader::{ContentReader, FsContentReader};
pub use repair::{IdRemap, RepairEngine};
