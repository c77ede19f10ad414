//! A single pipeline spec document

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::SpecError;
use super::input::Input;

/// A pipeline spec as loaded from disk
///
/// The document is kept as-is so fields this tool doesn't interpret are
/// passed through to the cluster untouched. Only `transform.image` is ever
/// rewritten.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    name: String,
    input: Input,
    source: PathBuf,
    document: Map<String, Value>,
}

impl PipelineSpec {
    /// Build a spec from a parsed document
    pub fn from_document(document: Value, source: impl Into<PathBuf>) -> Result<Self, SpecError> {
        let source = source.into();
        debug!(source = %source.display(), "PipelineSpec::from_document: called");

        let Value::Object(document) = document else {
            return Err(SpecError::Parse {
                path: source,
                message: "document must be an object".to_string(),
            });
        };

        let name = match document
            .get("pipeline")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
        {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(SpecError::MissingName { path: source }),
        };

        let input = Input::parse(document.get("input")).map_err(|e| SpecError::InvalidInput {
            path: source.clone(),
            source: e,
        })?;

        Ok(Self {
            name,
            input,
            source,
            document,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Path the spec was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Value of `transform.image`, if declared as a string
    pub fn image(&self) -> Option<&str> {
        self.document
            .get("transform")
            .and_then(|t| t.get("image"))
            .and_then(Value::as_str)
    }

    /// Replace `transform.image` when the transform declares one
    ///
    /// Returns false (and leaves the document alone) when there is no
    /// image field to replace.
    pub fn set_image(&mut self, image: &str) -> bool {
        let Some(field) = self
            .document
            .get_mut("transform")
            .and_then(Value::as_object_mut)
            .and_then(|t| t.get_mut("image"))
        else {
            debug!(pipeline = %self.name, "set_image: no image field");
            return false;
        };
        *field = Value::String(image.to_string());
        true
    }
}
