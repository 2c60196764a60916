use std::fmt::Display;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::state::ConcreteId;

/// Fatal conditions of a model load. Any of them aborts the whole load.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A trace or state row does not match its column schema
    #[error("Malformed record at {location}: {reason}")]
    MalformedRecord { location: String, reason: String },

    /// A source, result or widget reference does not resolve as expected
    #[error("Identity mismatch (enable compatibility mode to attempt a repair): {0}")]
    IdentityMismatch(String),

    /// Compatibility mode found no candidate for a drifted widget reference
    #[error("Cannot re-compute target widget {widget} in state {state}")]
    RepairExhausted {
        widget: ConcreteId,
        state: ConcreteId,
    },

    /// Reading a trace or state file failed
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker or action task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl LoadError {
    pub fn malformed(location: impl Display, reason: impl Display) -> Self {
        LoadError::MalformedRecord {
            location: location.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
