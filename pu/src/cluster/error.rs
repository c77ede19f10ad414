//! Cluster error types

use thiserror::Error;

/// Errors that can occur while talking to the cluster
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("Failed to connect to cluster at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("Cluster rejected pipeline '{pipeline}'{}: {message}", format_status(.status))]
    Apply {
        pipeline: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Cannot build request for pipeline '{pipeline}': {message}")]
    InvalidRequest { pipeline: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ClusterError {
    /// Pipeline the error concerns, if any
    pub fn pipeline(&self) -> Option<&str> {
        match self {
            ClusterError::Apply { pipeline, .. } | ClusterError::InvalidRequest { pipeline, .. } => Some(pipeline),
            ClusterError::Connect { .. } | ClusterError::Client(_) => None,
        }
    }

    /// Check if this is a connection/authentication failure
    pub fn is_connect(&self) -> bool {
        matches!(self, ClusterError::Connect { .. })
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}
