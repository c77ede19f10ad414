//! Run-level error type
//!
//! Each stage has its own error enum; `UpdateError` names the stage that
//! failed so the binary can report it before exiting non-zero.

use thiserror::Error;

use crate::apply::ApplyError;
use crate::cluster::ClusterError;
use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::spec::SpecError;

/// Errors that abort an update run
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Collecting pipeline specs failed: {0}")]
    Spec(#[from] SpecError),

    #[error("Ordering pipelines failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Cluster connection failed: {0}")]
    Connect(#[source] ClusterError),

    #[error("Applying pipelines failed: {0}")]
    Apply(#[from] ApplyError),
}

impl UpdateError {
    /// Name of the stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            UpdateError::Config(_) => "config",
            UpdateError::Spec(e) if e.is_parse_error() => "parse",
            UpdateError::Spec(_) => "collect",
            UpdateError::Graph(_) => "order",
            UpdateError::Connect(_) => "connect",
            UpdateError::Apply(_) => "apply",
        }
    }

    /// Pipelines applied before the failure (only apply failures have any)
    pub fn applied(&self) -> &[String] {
        match self {
            UpdateError::Apply(e) => &e.applied,
            _ => &[],
        }
    }
}
