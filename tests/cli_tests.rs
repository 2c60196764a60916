use std::path::PathBuf;

use clap::Parser;
use exploration_model::cli::commands::{RepairReport, cmd_load, cmd_repair};
use exploration_model::cli::config::{AppConfig, Cli, Commands, build_model_config, load_config};
use exploration_model::loading::RemapTable;
use exploration_model::state::ConcreteId;

use crate::common::fixtures::{ModelDir, button, click, label, moved, press_back};

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_load_minimal() {
    let cli = Cli::parse_from(["exploration-model", "load"]);
    match cli.command {
        Commands::Load {
            sequential,
            auto_fix,
            log_interactions,
            json,
        } => {
            assert!(!sequential);
            assert!(!auto_fix);
            assert_eq!(log_interactions, None);
            assert!(!json);
        }
        _ => panic!("Expected Load command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.dir.is_none());
}

#[test]
fn cli_parse_load_all_args() {
    let cli = Cli::parse_from([
        "exploration-model",
        "load",
        "--sequential",
        "--auto-fix",
        "--log-interactions",
        "events.jsonl",
        "--json",
        "--dir",
        "/data/run1",
        "--separator",
        ",",
        "-vv",
    ]);
    match cli.command {
        Commands::Load {
            sequential,
            auto_fix,
            log_interactions,
            json,
        } => {
            assert!(sequential);
            assert!(auto_fix);
            assert_eq!(log_interactions.as_deref(), Some("events.jsonl"));
            assert!(json);
        }
        _ => panic!("Expected Load command"),
    }
    assert_eq!(cli.dir, Some(PathBuf::from("/data/run1")));
    assert_eq!(cli.separator.as_deref(), Some(","));
    assert_eq!(cli.verbose, 2);
}

#[test]
fn cli_parse_repair_output() {
    let cli = Cli::parse_from(["exploration-model", "repair", "-o", "remap.json"]);
    match cli.command {
        Commands::Repair { output, parallel } => {
            assert_eq!(output.as_deref(), Some("remap.json"));
            assert!(!parallel, "Repairs run sequentially by default");
        }
        _ => panic!("Expected Repair command"),
    }
}

#[test]
fn cli_parse_repair_parallel() {
    let cli = Cli::parse_from(["exploration-model", "repair", "--parallel"]);
    match cli.command {
        Commands::Repair { output, parallel } => {
            assert!(parallel);
            assert!(output.is_none());
        }
        _ => panic!("Expected Repair command"),
    }
}

#[test]
fn cli_rejects_unknown_subcommand() {
    assert!(Cli::try_parse_from(["exploration-model", "explore"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn load_config_missing_file_uses_defaults() {
    let config = load_config(Some("/nonexistent/exploration-model.yaml"));
    assert_eq!(config.model.trace_file_prefix, "trace");
    assert_eq!(config.model.separator, ";");
    assert_eq!(config.model.states_dir, "states");
    assert!(!config.load.sequential);
}

#[test]
fn load_config_reads_yaml() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("exploration-model.yaml");
    std::fs::write(
        &path,
        "model:\n  base_dir: /data/run1\n  trace_file_prefix: run\nload:\n  auto_fix: true\n",
    )
    .unwrap();

    let config = load_config(path.to_str());

    assert_eq!(config.model.base_dir, PathBuf::from("/data/run1"));
    assert_eq!(config.model.trace_file_prefix, "run");
    assert_eq!(config.model.trace_file_extension, ".csv", "Unset keys keep defaults");
    assert!(config.load.auto_fix);
    assert!(!config.load.sequential);
}

#[test]
fn load_config_malformed_yaml_uses_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "model: [unclosed").unwrap();

    let config = load_config(path.to_str());

    assert_eq!(config.model.trace_file_prefix, "trace");
}

#[test]
fn build_model_config_cli_overrides_file() {
    let mut app = AppConfig::default();
    app.model.trace_file_prefix = "run".into();
    app.model.separator = "|".into();

    let config = build_model_config(&app, Some(PathBuf::from("/cli/dir")), None, Some(",".into()), 2);

    assert_eq!(config.base_dir, PathBuf::from("/cli/dir"));
    assert_eq!(config.trace_file_prefix, "run", "File value without CLI override");
    assert_eq!(config.separator, ",");
    assert!(config.debug, "-vv enables per-record logging");

    let quiet = build_model_config(&app, None, None, None, 1);
    assert!(!quiet.debug);
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn repair_report_uses_textual_ids() {
    let from = button("A", 0).id;
    let to = button("B", 0).id;
    let mut widgets = RemapTable::new();
    widgets.insert(from, to);

    let report = RepairReport::new(&RemapTable::new(), &widgets);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["states"], serde_json::json!({}));
    assert_eq!(json["widgets"][from.to_string()], to.to_string());
}

#[tokio::test]
async fn cmd_repair_writes_remap_file() {
    let dir = ModelDir::new();
    let ok = button("OK", 0);
    let s1 = dir.write_state(&[ok.clone()]);
    let s2 = dir.write_state(&[label("Done", 0)]);
    let stale = moved(&ok, 500);
    dir.write_trace(
        "_0",
        &[press_back(ConcreteId::EMPTY, s1, 1), click(&stale, s1, s2, 2)],
    );
    let output = dir.path().join("remap.json");

    cmd_repair(&dir.config, output.to_str(), true, 0).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["widgets"][stale.id.to_string()], ok.id.to_string());
}

#[tokio::test]
async fn cmd_load_fails_on_drift_without_auto_fix() {
    let dir = ModelDir::new();
    let ok = button("OK", 0);
    let s1 = dir.write_state(&[ok.clone()]);
    let stale = moved(&ok, 500);
    dir.write_trace("_0", &[click(&stale, s1, s1, 1)]);

    assert!(cmd_load(&dir.config, true, false, None, false, 0).await.is_err());
    assert!(cmd_load(&dir.config, true, true, None, true, 0).await.is_ok());
}
