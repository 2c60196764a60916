use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::loading::{LoadOptions, ModelConfig, ModelParser, RemapTable};
use crate::trace::TraceLogger;

// ============================================================================
// load subcommand
// ============================================================================

pub async fn cmd_load(
    config: &ModelConfig,
    sequential: bool,
    auto_fix: bool,
    log_interactions: Option<&str>,
    json: bool,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = LoadOptions {
        sequential,
        ..LoadOptions::default()
    }
    .with_auto_fix(auto_fix);
    if let Some(path) = log_interactions {
        options = options.with_observer(Arc::new(TraceLogger::new(path)));
    }

    if verbose > 0 {
        eprintln!(
            "Loading {} ({}, auto-fix={})...",
            config.base_dir.display(),
            if sequential { "sequential" } else { "parallel" },
            auto_fix
        );
    }

    let model = ModelParser::load(config, options).await?;
    let summary = model.summary().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    // Print summary
    println!(
        "Loaded {} states, {} widgets, {} traces, {} interactions",
        summary.states.len(),
        summary.widgets.len(),
        summary.traces.len(),
        summary.interaction_count()
    );
    for trace in &summary.traces {
        println!("  [{}] {} interactions", trace.id, trace.edges.len());
    }

    Ok(())
}

// ============================================================================
// repair subcommand
// ============================================================================

#[derive(Debug, Serialize)]
pub struct RepairReport {
    pub states: BTreeMap<String, String>,
    pub widgets: BTreeMap<String, String>,
}

impl RepairReport {
    pub fn new(state_remap: &RemapTable, widget_remap: &RemapTable) -> Self {
        let stringify = |table: &RemapTable| {
            table
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect()
        };
        Self {
            states: stringify(state_remap),
            widgets: stringify(widget_remap),
        }
    }
}

pub async fn cmd_repair(
    config: &ModelConfig,
    output: Option<&str>,
    sequential: bool,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = ModelParser::load_and_repair(config, sequential).await?;
    let report = RepairReport::new(&loaded.state_remap, &loaded.widget_remap);

    if verbose > 0 {
        eprintln!(
            "Repaired {} state ids and {} widget ids",
            report.states.len(),
            report.widgets.len()
        );
    }

    let content = serde_json::to_string_pretty(&report)?;

    // Write or print
    match output {
        Some(path) => std::fs::write(path, &content)?,
        None => println!("{}", content),
    }

    Ok(())
}
