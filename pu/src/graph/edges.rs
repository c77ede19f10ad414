//! Dependency edge extraction

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::spec::{PipelineCollection, PipelineSpec, SourceRef};

/// `pipeline` reads from `source`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyEdge {
    pub source: String,
    pub pipeline: String,
}

impl DependencyEdge {
    pub fn new(source: impl Into<String>, pipeline: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            pipeline: pipeline.into(),
        }
    }
}

impl fmt::Display for DependencyEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.pipeline)
    }
}

/// Upstream sources declared by one spec
pub fn source_refs(spec: &PipelineSpec) -> &[SourceRef] {
    spec.input().sources()
}

/// Edges for every source of every spec, in collection order
pub fn dependency_edges(collection: &PipelineCollection) -> Vec<DependencyEdge> {
    debug!(pipeline_count = collection.len(), "dependency_edges: called");
    let edges: Vec<DependencyEdge> = collection
        .iter()
        .flat_map(|spec| {
            source_refs(spec)
                .iter()
                .map(move |source| DependencyEdge::new(source.as_str(), spec.name()))
        })
        .collect();
    debug!(edge_count = edges.len(), "dependency_edges: complete");
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edges_follow_inputs() {
        let collection: PipelineCollection = vec![
            json!({"pipeline": {"name": "edges"}, "input": {"pfs": {"repo": "images"}}}),
            json!({"pipeline": {"name": "montage"}, "input": {"cross": [
                {"pfs": {"repo": "images"}},
                {"pfs": {"repo": "edges"}}
            ]}}),
            json!({"pipeline": {"name": "tick"}, "input": {"cron": {"name": "tick"}}}),
        ]
        .into_iter()
        .map(|doc| PipelineSpec::from_document(doc, "test.json").unwrap())
        .collect();

        let edges = dependency_edges(&collection);

        assert_eq!(
            edges,
            vec![
                DependencyEdge::new("images", "edges"),
                DependencyEdge::new("images", "montage"),
                DependencyEdge::new("edges", "montage"),
            ]
        );
    }

    #[test]
    fn test_duplicate_sources_are_kept() {
        let collection: PipelineCollection = vec![PipelineSpec::from_document(
            json!({"pipeline": {"name": "self-join"}, "input": {"join": [
                {"pfs": {"repo": "rows"}},
                {"pfs": {"repo": "rows"}}
            ]}}),
            "test.json",
        )
        .unwrap()]
        .into_iter()
        .collect();

        assert_eq!(dependency_edges(&collection).len(), 2);
    }

    #[test]
    fn test_edge_display() {
        assert_eq!(DependencyEdge::new("images", "edges").to_string(), "images -> edges");
    }
}
