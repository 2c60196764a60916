use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::loading::ModelConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "exploration-model",
    version,
    about = "Rebuild exploration models from persisted trace files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: exploration-model.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Model directory holding the trace files
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// File name prefix of trace files
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Column separator of trace and state rows
    #[arg(long, global = true)]
    pub separator: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a model and print a summary
    Load {
        /// Use a single worker instead of the parallel pool
        #[arg(long)]
        sequential: bool,

        /// Repair identifier drift instead of failing
        #[arg(long)]
        auto_fix: bool,

        /// Append every applied interaction to this JSONL file
        #[arg(long)]
        log_interactions: Option<String>,

        /// Print the full graph summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load with repairs enabled and write the identifier remapping as JSON
    Repair {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Use the parallel worker pool instead of a single worker
        #[arg(long)]
        parallel: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `exploration-model.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub sequential: bool,

    #[serde(default)]
    pub auto_fix: bool,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("exploration-model.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = config_path, error = %e, "ignoring malformed config file");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build a ModelConfig from CLI overrides on top of the config file.
pub fn build_model_config(
    config: &AppConfig,
    dir: Option<PathBuf>,
    prefix: Option<String>,
    separator: Option<String>,
    verbose: u8,
) -> ModelConfig {
    let mut model = config.model.clone();
    if let Some(dir) = dir {
        model.base_dir = dir;
    }
    if let Some(prefix) = prefix {
        model.trace_file_prefix = prefix;
    }
    if let Some(separator) = separator {
        model.separator = separator;
    }
    model.debug |= verbose >= 2;
    model
}
