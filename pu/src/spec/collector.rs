//! Load pipeline specs from files, directories and glob patterns
//!
//! Every path must resolve: a missing path, an unreadable file or a
//! malformed document aborts the whole collection. Directories are walked
//! recursively in file-name order so repeated runs see the same sequence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{PipelineCollection, PipelineSpec, SpecError};

/// Document serialization, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Json,
    Yaml,
}

impl SpecFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Collect specs from the given paths, in order
pub fn collect(paths: &[String]) -> Result<PipelineCollection, SpecError> {
    debug!(?paths, "collect: called");
    let mut collection = PipelineCollection::new();

    for raw in paths {
        for path in expand(raw)? {
            collect_path(&path, &mut collection)?;
        }
    }

    info!(pipeline_count = collection.len(), "Collected pipeline specs");
    Ok(collection)
}

/// Load a single spec file
pub fn load_spec(path: &Path) -> Result<PipelineSpec, SpecError> {
    debug!(path = %path.display(), "load_spec: called");
    let content = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    let document = parse_document(path, &content)?;
    PipelineSpec::from_document(document, path)
}

fn parse_document(path: &Path, content: &str) -> Result<Value, SpecError> {
    let parsed = match SpecFormat::from_path(path) {
        SpecFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        SpecFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| SpecError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn is_pattern(raw: &str) -> bool {
    raw.contains(['*', '?', '['])
}

fn expand(raw: &str) -> Result<Vec<PathBuf>, SpecError> {
    if !is_pattern(raw) {
        return Ok(vec![PathBuf::from(raw)]);
    }

    debug!(pattern = %raw, "expand: globbing");
    let entries = glob::glob(raw).map_err(|e| SpecError::Pattern {
        pattern: raw.to_string(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            io_error(&path, e.into_error())
        })?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(SpecError::NotFound {
            path: PathBuf::from(raw),
        });
    }
    Ok(paths)
}

fn collect_path(path: &Path, collection: &mut PipelineCollection) -> Result<(), SpecError> {
    let metadata = fs::metadata(path).map_err(|source| io_error(path, source))?;

    if metadata.is_file() {
        debug!(path = %path.display(), "collect_path: file");
        collection.insert(load_spec(path)?);
        return Ok(());
    }

    if !metadata.is_dir() {
        return Err(SpecError::Unsupported {
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "collect_path: walking directory");
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let at = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
            io_error(&at, source)
        })?;

        if entry.file_type().is_file() {
            collection.insert(load_spec(entry.path())?);
        }
    }
    Ok(())
}

fn io_error(path: &Path, source: io::Error) -> SpecError {
    if source.kind() == io::ErrorKind::NotFound {
        SpecError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        SpecError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
