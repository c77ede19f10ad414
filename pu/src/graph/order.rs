//! Apply order computation
//!
//! Every pipeline in the collection is a node, including pipelines with no
//! dependency edges at all; edges only constrain where they exist. Sources
//! that aren't the name of a loaded pipeline are external repos: they take
//! part in the ordering as origins but are never emitted.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use super::{DependencyEdge, DependencyGraph, GraphError, dependency_edges};
use crate::spec::PipelineCollection;

/// Pipeline names in the order they must be applied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApplyOrder(Vec<String>);

impl ApplyOrder {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Position of a pipeline in the order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }
}

impl fmt::Display for ApplyOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" -> "))
    }
}

impl FromIterator<String> for ApplyOrder {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ApplyOrder {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Graph over every pipeline plus the sources its edges mention
///
/// Pipelines are interned first, in collection order, then edge endpoints
/// in edge order. This fixes the tie-break between independent pipelines.
pub fn build_graph(collection: &PipelineCollection, edges: &[DependencyEdge]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for name in collection.names() {
        graph.add_node(name);
    }
    for edge in edges {
        if !collection.contains(&edge.source) {
            debug!(source = %edge.source, pipeline = %edge.pipeline, "build_graph: external source");
        }
        graph.add_edge(&edge.source, &edge.pipeline);
    }
    graph
}

/// Order an explicit edge set, keeping only loaded pipelines
pub fn order_edges(collection: &PipelineCollection, edges: &[DependencyEdge]) -> Result<ApplyOrder, GraphError> {
    debug!(
        pipeline_count = collection.len(),
        edge_count = edges.len(),
        "order_edges: called"
    );
    let graph = build_graph(collection, edges);

    let isolated = graph.isolated().count();
    if isolated > 0 {
        info!(isolated, "Pipelines without dependency edges are included in the apply order");
    }

    let order: Vec<String> = graph
        .topological_order()?
        .into_iter()
        .filter(|name| collection.contains(name))
        .map(str::to_string)
        .collect();

    info!(order = %order.join(" -> "), "Computed apply order");
    Ok(ApplyOrder(order))
}

/// Extract edges from the collection and order it
pub fn apply_order(collection: &PipelineCollection) -> Result<ApplyOrder, GraphError> {
    let edges = dependency_edges(collection);
    order_edges(collection, &edges)
}
