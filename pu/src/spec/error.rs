//! Spec loading error types

use std::path::{Path, PathBuf};
use thiserror::Error;

use super::input::InputError;

/// Errors that can occur while collecting pipeline specs from disk
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Pipeline spec path not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Not a regular file or directory: {}", .path.display())]
    Unsupported { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} does not declare pipeline.name", .path.display())]
    MissingName { path: PathBuf },

    #[error("Invalid input in {}: {source}", .path.display())]
    InvalidInput {
        path: PathBuf,
        #[source]
        source: InputError,
    },
}

impl SpecError {
    /// The offending path, when the error is tied to one
    pub fn path(&self) -> Option<&Path> {
        match self {
            SpecError::NotFound { path }
            | SpecError::Unsupported { path }
            | SpecError::Io { path, .. }
            | SpecError::Parse { path, .. }
            | SpecError::MissingName { path }
            | SpecError::InvalidInput { path, .. } => Some(path),
            SpecError::Pattern { .. } => None,
        }
    }

    /// Check if the document itself is malformed (as opposed to unreadable)
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            SpecError::Parse { .. } | SpecError::MissingName { .. } | SpecError::InvalidInput { .. }
        )
    }
}
