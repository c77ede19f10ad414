//! Dependency graph construction and apply ordering

mod dag;
mod edges;
mod error;
mod order;

pub use dag::DependencyGraph;
pub use edges::{DependencyEdge, dependency_edges, source_refs};
pub use error::GraphError;
pub use order::{ApplyOrder, apply_order, build_graph, order_edges};
