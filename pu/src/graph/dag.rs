//! Owned directed graph with Kahn's algorithm ordering
//!
//! Nodes are interned in first-seen order and edges are kept as adjacency
//! lists of node indices, alongside in-degree counts. Ordering uses a FIFO
//! ready queue seeded in node order, so the result is fully determined by
//! the order nodes and edges were added.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use super::{DependencyEdge, GraphError};

/// Directed dependency graph (edges point from producer to consumer)
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    ids: HashMap<String, usize>,
    out_edges: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from edges alone
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a DependencyEdge>) -> Self {
        let mut graph = Self::new();
        for edge in edges {
            graph.add_edge(&edge.source, &edge.pipeline);
        }
        graph
    }

    /// Intern a node, returning its index
    pub fn add_node(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        self.out_edges.push(Vec::new());
        self.in_degree.push(0);
        id
    }

    /// Add `from -> to`; parallel edges are allowed
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        self.out_edges[from].push(to);
        self.in_degree[to] += 1;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.out_edges.iter().map(Vec::len).sum()
    }

    /// Nodes with no edges in either direction
    pub fn isolated(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|&(id, _)| self.in_degree[id] == 0 && self.out_edges[id].is_empty())
            .map(|(_, name)| name.as_str())
    }

    /// Downstream neighbours of a node
    pub fn successors(&self, name: &str) -> Vec<&str> {
        self.ids
            .get(name)
            .map(|&id| self.out_edges[id].iter().map(|&to| self.nodes[to].as_str()).collect())
            .unwrap_or_default()
    }

    /// Every node, producers before consumers
    pub fn topological_order(&self) -> Result<Vec<&str>, GraphError> {
        debug!(
            node_count = self.node_count(),
            edge_count = self.edge_count(),
            "topological_order: called"
        );
        let mut in_degree = self.in_degree.clone();
        let mut ready: VecDeque<usize> = (0..self.nodes.len()).filter(|&id| in_degree[id] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_front() {
            order.push(self.nodes[id].as_str());
            for &to in &self.out_edges[id] {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.push_back(to);
                }
            }
        }

        if order.len() < self.nodes.len() {
            let remaining: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
            let members = self.find_cycle(&remaining);
            debug!(?members, "topological_order: cycle detected");
            return Err(GraphError::CyclicDependency { members });
        }

        debug!(order_len = order.len(), "topological_order: complete");
        Ok(order)
    }

    /// Locate one concrete cycle among nodes Kahn's pass could not release
    fn find_cycle(&self, remaining: &[bool]) -> Vec<String> {
        let mut visited = vec![false; self.nodes.len()];
        let mut on_stack = vec![false; self.nodes.len()];
        let mut path = Vec::new();

        for start in (0..self.nodes.len()).filter(|&id| remaining[id]) {
            if !visited[start]
                && let Some(cycle) = self.cycle_dfs(start, remaining, &mut visited, &mut on_stack, &mut path)
            {
                return cycle.into_iter().map(|id| self.nodes[id].clone()).collect();
            }
        }
        Vec::new()
    }

    fn cycle_dfs(
        &self,
        node: usize,
        remaining: &[bool],
        visited: &mut [bool],
        on_stack: &mut [bool],
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        visited[node] = true;
        on_stack[node] = true;
        path.push(node);

        for &next in &self.out_edges[node] {
            if !remaining[next] {
                continue;
            }
            if on_stack[next] {
                let start = path.iter().position(|&id| id == next).unwrap_or(0);
                return Some(path[start..].to_vec());
            }
            if !visited[next]
                && let Some(cycle) = self.cycle_dfs(next, remaining, visited, on_stack, path)
            {
                return Some(cycle);
            }
        }

        on_stack[node] = false;
        path.pop();
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(order: &[&str], name: &str) -> usize {
        order.iter().position(|&n| n == name).unwrap()
    }

    #[test]
    fn test_chain() {
        let edges = vec![DependencyEdge::new("A", "B"), DependencyEdge::new("B", "C")];
        let graph = DependencyGraph::from_edges(&edges);

        assert_eq!(graph.topological_order().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_diamond() {
        let edges = vec![
            DependencyEdge::new("A", "B"),
            DependencyEdge::new("A", "C"),
            DependencyEdge::new("B", "D"),
            DependencyEdge::new("C", "D"),
        ];
        let graph = DependencyGraph::from_edges(&edges);
        let order = graph.topological_order().unwrap();

        assert_eq!(order.len(), 4);
        assert!(position(&order, "A") < position(&order, "B"));
        assert!(position(&order, "A") < position(&order, "C"));
        assert!(position(&order, "B") < position(&order, "D"));
        assert!(position(&order, "C") < position(&order, "D"));
    }

    #[test]
    fn test_parallel_edges_are_harmless() {
        let edges = vec![
            DependencyEdge::new("A", "B"),
            DependencyEdge::new("A", "B"),
            DependencyEdge::new("B", "C"),
        ];
        let graph = DependencyGraph::from_edges(&edges);

        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.topological_order().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_two_node_cycle() {
        let edges = vec![DependencyEdge::new("B", "A"), DependencyEdge::new("A", "B")];
        let graph = DependencyGraph::from_edges(&edges);

        let err = graph.topological_order().unwrap_err();
        let mut members = err.cycle().to_vec();
        members.sort();
        assert_eq!(members, vec!["A", "B"]);
    }

    #[test]
    fn test_self_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge("A", "A");

        let err = graph.topological_order().unwrap_err();
        assert_eq!(err.cycle(), &["A".to_string()]);
    }

    #[test]
    fn test_cycle_downstream_of_acyclic_nodes() {
        // ext -> A -> B -> C -> B, C -> D
        let edges = vec![
            DependencyEdge::new("ext", "A"),
            DependencyEdge::new("A", "B"),
            DependencyEdge::new("B", "C"),
            DependencyEdge::new("C", "B"),
            DependencyEdge::new("C", "D"),
        ];
        let graph = DependencyGraph::from_edges(&edges);

        let err = graph.topological_order().unwrap_err();
        let mut members = err.cycle().to_vec();
        members.sort();
        assert_eq!(members, vec!["B", "C"]);
    }

    #[test]
    fn test_isolated_and_successors() {
        let mut graph = DependencyGraph::new();
        graph.add_node("lonely");
        graph.add_edge("A", "B");
        graph.add_edge("A", "C");

        assert_eq!(graph.isolated().collect::<Vec<_>>(), vec!["lonely"]);
        assert_eq!(graph.successors("A"), vec!["B", "C"]);
        assert!(graph.successors("missing").is_empty());
        assert!(graph.contains("lonely"));
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.topological_order().unwrap().is_empty());
    }
}
