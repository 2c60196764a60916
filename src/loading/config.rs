use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::state::ConcreteId;
use crate::trace::TraceId;

/// Location and layout of a persisted exploration model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding the trace files
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Sub-directory of `base_dir` holding one file per state
    #[serde(default = "default_states_dir")]
    pub states_dir: String,

    #[serde(default = "default_trace_prefix")]
    pub trace_file_prefix: String,

    #[serde(default = "default_extension")]
    pub trace_file_extension: String,

    #[serde(default = "default_extension")]
    pub state_file_extension: String,

    /// Column separator of trace and state rows
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Log every parsed record
    #[serde(default)]
    pub debug: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            states_dir: default_states_dir(),
            trace_file_prefix: default_trace_prefix(),
            trace_file_extension: default_extension(),
            state_file_extension: default_extension(),
            separator: default_separator(),
            debug: false,
        }
    }
}

impl ModelConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn states_path(&self) -> PathBuf {
        self.base_dir.join(&self.states_dir)
    }

    pub fn state_file(&self, id: &ConcreteId) -> PathBuf {
        self.states_path()
            .join(format!("{}{}", id, self.state_file_extension))
    }

    pub fn is_trace_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&self.trace_file_prefix))
    }

    pub fn trace_id(&self, path: &Path, ordinal: usize) -> TraceId {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        TraceId::from_file_name(
            file_name,
            &self.trace_file_prefix,
            &self.trace_file_extension,
            ordinal,
        )
    }
}

// Serde default helpers
fn default_base_dir() -> PathBuf { PathBuf::from(".") }
fn default_states_dir() -> String { "states".to_string() }
fn default_trace_prefix() -> String { "trace".to_string() }
fn default_extension() -> String { ".csv".to_string() }
fn default_separator() -> String { ";".to_string() }
