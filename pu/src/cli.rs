//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// pipeupdater - roll a new image out to Pachyderm pipelines
#[derive(Parser)]
#[command(
    name = "pu",
    about = "Rewrite pipeline images and apply pipelines in dependency order",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite images and apply every pipeline to the cluster
    Apply {
        #[command(flatten)]
        target: TargetArgs,

        /// Cluster URL (overrides PACHYDERM_CLUSTER_URL)
        #[arg(long)]
        cluster_url: Option<String>,

        /// Compute and print the order without contacting the cluster
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the apply order without contacting the cluster
    Plan {
        #[command(flatten)]
        target: TargetArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Spec paths and image, shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Spec files, directories or glob patterns (overrides PACHYDERM_PIPELINE_FILES)
    #[arg(value_name = "PATHS")]
    pub paths: Vec<String>,

    /// Image repository (overrides DOCKER_IMAGE_NAME)
    #[arg(short, long)]
    pub repository: Option<String>,

    /// Image revision/tag (overrides GITHUB_SHA)
    #[arg(short = 'R', long)]
    pub revision: Option<String>,
}

impl TargetArgs {
    /// Apply CLI values on top of file and environment config
    pub fn apply_to(&self, config: &mut Config) {
        debug!(?self, "TargetArgs::apply_to: called");
        if !self.paths.is_empty() {
            config.pipelines = self.paths.clone();
        }
        if let Some(repository) = &self.repository {
            config.image.repository = Some(repository.clone());
        }
        if let Some(revision) = &self.revision {
            config.image.revision = Some(revision.clone());
        }
    }
}

/// Output format for the plan command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
