use clap::Parser;
use exploration_model::cli::commands::{cmd_load, cmd_repair};
use exploration_model::cli::config::{Cli, Commands, build_model_config, load_config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let app_config = load_config(cli.config.as_deref());

    // Resolve model settings: CLI > config > defaults
    let model_config = build_model_config(&app_config, cli.dir, cli.prefix, cli.separator, cli.verbose);

    match cli.command {
        Commands::Load {
            sequential,
            auto_fix,
            log_interactions,
            json,
        } => {
            cmd_load(
                &model_config,
                sequential || app_config.load.sequential,
                auto_fix || app_config.load.auto_fix,
                log_interactions.as_deref(),
                json,
                cli.verbose,
            )
            .await?;
        }
        Commands::Repair { output, parallel } => {
            cmd_repair(&model_config, output.as_deref(), !parallel, cli.verbose).await?;
        }
    }

    Ok(())
}
