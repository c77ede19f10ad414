//! Pipeline input declarations
//!
//! A pipeline's `input` is either a single `pfs` source or exactly one
//! composite operator (`union`, `cross`, `join`, `group`) holding a list of
//! entries. The shape is decided once here, at parse time:
//!
//! ```json
//! { "pfs": { "repo": "images", "glob": "/*" } }
//! { "cross": [ { "pfs": { "repo": "images" } }, { "pfs": { "repo": "labels" } } ] }
//! ```
//!
//! Nested composites are flattened into their leaf sources. Leaves that do
//! not read from a repo (`cron`) contribute no source.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier of an upstream repo a pipeline reads from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(repo: impl Into<String>) -> Self {
        Self(repo.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(repo: &str) -> Self {
        Self::new(repo)
    }
}

/// Composite input operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Union,
    Cross,
    Join,
    Group,
}

impl CompositeKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "union" => Some(Self::Union),
            "cross" => Some(Self::Cross),
            "join" => Some(Self::Join),
            "group" => Some(Self::Group),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Cross => "cross",
            Self::Join => "join",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for input shapes that cannot be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("input must be an object")]
    NotAnObject,

    #[error("pfs input does not declare a repo")]
    MissingRepo,

    #[error("{0} input must be a list")]
    NotAList(CompositeKind),

    #[error("{0} entries must be objects")]
    InvalidEntry(CompositeKind),

    #[error("input declares more than one operator: {0}")]
    MultipleOperators(String),
}

/// Upstream sources declared by a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    /// No repo input (absent, null, or a cron-only input)
    #[default]
    None,
    Single(SourceRef),
    Composite { kind: CompositeKind, sources: Vec<SourceRef> },
}

impl Input {
    /// Interpret the `input` field of a pipeline document
    pub fn parse(value: Option<&Value>) -> Result<Self, InputError> {
        debug!(present = value.is_some(), "Input::parse: called");
        let map = match value {
            None | Some(Value::Null) => return Ok(Input::None),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(InputError::NotAnObject),
        };

        if let Some(pfs) = map.get("pfs") {
            return Ok(Input::Single(pfs_repo(pfs)?));
        }

        let (kind, entries) = match single_operator(map)? {
            Some(operator) => operator,
            None => {
                if !map.contains_key("cron") {
                    warn!(keys = ?map.keys().collect::<Vec<_>>(), "Input::parse: unrecognized input shape, no sources");
                }
                return Ok(Input::None);
            }
        };

        let mut sources = Vec::new();
        collect_sources(kind, entries, &mut sources)?;
        debug!(%kind, source_count = sources.len(), "Input::parse: composite");
        Ok(Input::Composite { kind, sources })
    }

    /// All sources in declaration order
    pub fn sources(&self) -> &[SourceRef] {
        match self {
            Input::None => &[],
            Input::Single(source) => std::slice::from_ref(source),
            Input::Composite { sources, .. } => sources,
        }
    }

    pub fn is_none(&self) -> bool {
        self.sources().is_empty()
    }
}

fn pfs_repo(pfs: &Value) -> Result<SourceRef, InputError> {
    pfs.get("repo")
        .and_then(Value::as_str)
        .filter(|repo| !repo.is_empty())
        .map(SourceRef::new)
        .ok_or(InputError::MissingRepo)
}

fn single_operator(map: &Map<String, Value>) -> Result<Option<(CompositeKind, &Value)>, InputError> {
    let mut operators = map
        .iter()
        .filter_map(|(key, value)| CompositeKind::from_key(key).map(|kind| (kind, value)));

    let first = operators.next();
    if first.is_some() && operators.next().is_some() {
        let keys: Vec<&str> = map
            .keys()
            .filter(|key| CompositeKind::from_key(key).is_some())
            .map(String::as_str)
            .collect();
        return Err(InputError::MultipleOperators(keys.join(", ")));
    }
    Ok(first)
}

fn collect_sources(kind: CompositeKind, entries: &Value, sources: &mut Vec<SourceRef>) -> Result<(), InputError> {
    let entries = entries.as_array().ok_or(InputError::NotAList(kind))?;

    for entry in entries {
        let map = entry.as_object().ok_or(InputError::InvalidEntry(kind))?;

        if let Some(pfs) = map.get("pfs") {
            sources.push(pfs_repo(pfs)?);
        } else if let Some((nested, nested_entries)) = single_operator(map)? {
            debug!(%kind, %nested, "collect_sources: flattening nested operator");
            collect_sources(nested, nested_entries, sources)?;
        } else {
            debug!(%kind, "collect_sources: entry reads no repo");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Input, InputError> {
        Input::parse(Some(&value))
    }

    #[test]
    fn test_absent_input_has_no_sources() {
        assert_eq!(Input::parse(None).unwrap(), Input::None);
        assert_eq!(parse(Value::Null).unwrap(), Input::None);
        assert!(Input::parse(None).unwrap().is_none());
    }

    #[test]
    fn test_single_pfs() {
        let input = parse(json!({"pfs": {"repo": "images", "glob": "/*"}})).unwrap();
        assert_eq!(input, Input::Single(SourceRef::new("images")));
        assert_eq!(input.sources(), &[SourceRef::new("images")]);
    }

    #[test]
    fn test_composite_cross() {
        let input = parse(json!({
            "cross": [
                {"pfs": {"repo": "images", "glob": "/*"}},
                {"pfs": {"repo": "labels", "glob": "/"}}
            ]
        }))
        .unwrap();

        assert_eq!(
            input,
            Input::Composite {
                kind: CompositeKind::Cross,
                sources: vec![SourceRef::new("images"), SourceRef::new("labels")],
            }
        );
    }

    #[test]
    fn test_nested_composite_is_flattened() {
        let input = parse(json!({
            "union": [
                {"pfs": {"repo": "a"}},
                {"cross": [{"pfs": {"repo": "b"}}, {"pfs": {"repo": "c"}}]}
            ]
        }))
        .unwrap();

        let names: Vec<&str> = input.sources().iter().map(SourceRef::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cron_has_no_sources() {
        let input = parse(json!({"cron": {"name": "tick", "spec": "@every 1h"}})).unwrap();
        assert_eq!(input, Input::None);

        let input = parse(json!({
            "cross": [{"cron": {"name": "tick"}}, {"pfs": {"repo": "data"}}]
        }))
        .unwrap();
        assert_eq!(input.sources(), &[SourceRef::new("data")]);
    }

    #[test]
    fn test_unknown_shape_has_no_sources() {
        assert_eq!(parse(json!({})).unwrap(), Input::None);
        assert_eq!(parse(json!({"spout": {}})).unwrap(), Input::None);
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(parse(json!("images")), Err(InputError::NotAnObject));
        assert_eq!(parse(json!({"pfs": {"glob": "/*"}})), Err(InputError::MissingRepo));
        assert_eq!(
            parse(json!({"union": {"pfs": {"repo": "a"}}})),
            Err(InputError::NotAList(CompositeKind::Union))
        );
        assert_eq!(
            parse(json!({"join": ["a"]})),
            Err(InputError::InvalidEntry(CompositeKind::Join))
        );
        assert!(matches!(
            parse(json!({"union": [], "cross": []})),
            Err(InputError::MultipleOperators(_))
        ));
    }
}
