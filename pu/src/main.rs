//! pipeupdater - CLI entry point
//!
//! Reads configuration from file, environment and flags, then plans or
//! applies a pipeline rollout.

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::json;
use tracing::{debug, error, info};

use pipeupdater::cli::{Cli, Command, OutputFormat, TargetArgs};
use pipeupdater::config::Config;
use pipeupdater::{Plan, UpdateError, Updater, plan};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = match level_str.map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("{}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.apply_env();

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Apply {
            target,
            cluster_url,
            dry_run,
        } => {
            if let Some(url) = cluster_url {
                config.cluster.url = Some(url);
            }
            cmd_apply(config, &target, dry_run).await
        }
        Command::Plan { target, format } => cmd_plan(config, &target, format),
    }
}

async fn cmd_apply(mut config: Config, target: &TargetArgs, dry_run: bool) -> Result<()> {
    target.apply_to(&mut config);

    if dry_run {
        info!("Dry run: the cluster will not be contacted");
        return cmd_plan(config, target, OutputFormat::Text);
    }

    let resolved = config.resolve().map_err(UpdateError::from).map_err(fail)?;
    let updater = Updater::new(resolved);
    let report = updater.run().await.map_err(fail)?;

    println!(
        "{} Applied {} pipeline(s) with image {}",
        "✓".green(),
        report.applied.len(),
        updater.config().image.to_string().cyan()
    );
    Ok(())
}

fn cmd_plan(mut config: Config, target: &TargetArgs, format: OutputFormat) -> Result<()> {
    target.apply_to(&mut config);

    let paths = config.pipeline_paths().map_err(UpdateError::from).map_err(fail)?;
    let image = config.image_ref();
    let plan = plan(paths, image.as_ref()).map_err(fail)?;

    match format {
        OutputFormat::Text => print_plan_text(&plan),
        OutputFormat::Json => print_plan_json(&plan)?,
    }
    Ok(())
}

fn print_plan_text(plan: &Plan) {
    match &plan.image {
        Some(image) => println!("Apply order (image {}):", image.to_string().cyan()),
        None => println!("Apply order:"),
    }
    for (idx, name) in plan.order.iter().enumerate() {
        let sources: Vec<&str> = plan
            .collection
            .get(name)
            .map(|spec| spec.input().sources().iter().map(|s| s.as_str()).collect())
            .unwrap_or_default();

        if sources.is_empty() {
            println!("  {:>3}. {}", idx + 1, name.bold());
        } else {
            println!("  {:>3}. {} {} {}", idx + 1, name.bold(), "<-".dimmed(), sources.join(", "));
        }
    }
}

fn print_plan_json(plan: &Plan) -> Result<()> {
    let output = json!({
        "image": plan.image.as_ref().map(|i| i.to_string()),
        "order": plan.order,
        "edges": plan.edges,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Log a run failure with its stage, then hand it to eyre for the exit status
fn fail(e: UpdateError) -> eyre::Report {
    error!(stage = e.stage(), error = %e, "Run failed");
    if !e.applied().is_empty() {
        eprintln!(
            "{} Applied before the failure (not rolled back): {}",
            "!".yellow(),
            e.applied().join(", ")
        );
    }
    let stage = e.stage();
    eyre::Report::new(e).wrap_err(format!("{} stage failed", stage))
}
