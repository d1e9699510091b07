//! Dependency graph (DAG) construction and traversal
//!
//! Holds forward and reverse edges between units and resolves the build
//! order. Edges only ever connect known nodes.

use std::collections::{HashMap, HashSet, VecDeque};

/// Node identifier (unit name)
pub type NodeId = String;

/// Dependency graph with forward and reverse edges
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// All nodes, in insertion (discovery) order
    nodes: Vec<NodeId>,

    /// Position of each node in `nodes`
    index: HashMap<NodeId, usize>,

    /// Forward edges: node -> sorted list of nodes it depends on (parents)
    parents: HashMap<NodeId, Vec<NodeId>>,

    /// Reverse edges: node -> sorted list of nodes that depend on it (children)
    children: HashMap<NodeId, Vec<NodeId>>,
}

/// The graph contains a cycle, so no build order exists
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cyclic dependency detected: {}", .cycle.join(" -> "))]
pub struct CycleError {
    /// Closed dependency path; first and last entries are the same unit
    pub cycle: Vec<NodeId>,
}

impl CycleError {
    /// Unit the cycle was detected at
    pub fn unit(&self) -> &str {
        self.cycle.first().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from node names and `(dependent, dependency)` pairs
    ///
    /// Pairs naming an unknown node are dropped.
    pub fn from_edges<N, E, S>(nodes: N, edges: E) -> Self
    where
        N: IntoIterator<Item = S>,
        E: IntoIterator<Item = (S, S)>,
        S: Into<NodeId>,
    {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node);
        }
        for (dependent, dependency) in edges {
            graph.add_edge(dependent.into(), dependency.into());
        }
        graph
    }

    /// Add a node; returns false if it already existed
    pub fn add_node(&mut self, node: impl Into<NodeId>) -> bool {
        let node = node.into();
        if self.index.contains_key(&node) {
            return false;
        }

        self.index.insert(node.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    /// Record that `dependent` depends on `dependency`
    ///
    /// Returns false when either end is unknown or the edge already exists.
    pub fn add_edge(&mut self, dependent: impl Into<NodeId>, dependency: impl Into<NodeId>) -> bool {
        let dependent = dependent.into();
        let dependency = dependency.into();

        if !self.contains(&dependent) || !self.contains(&dependency) {
            return false;
        }

        let deps = self.parents.entry(dependent.clone()).or_default();
        match deps.binary_search(&dependency) {
            Ok(_) => return false,
            Err(pos) => deps.insert(pos, dependency.clone()),
        }

        let dependents = self.children.entry(dependency).or_default();
        if let Err(pos) = dependents.binary_search(&dependent) {
            dependents.insert(pos, dependent);
        }

        true
    }

    /// Check whether a node exists
    pub fn contains(&self, node_id: &str) -> bool {
        self.index.contains_key(node_id)
    }

    /// Get all nodes in discovery order
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.parents.values().map(Vec::len).sum()
    }

    /// Get immediate parents (dependencies) of a node
    pub fn parents(&self, node_id: &str) -> &[NodeId] {
        self.parents.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get immediate children (dependents) of a node
    pub fn children(&self, node_id: &str) -> &[NodeId] {
        self.children.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Get all downstream nodes (transitive closure of children)
    ///
    /// These are the units that cannot be built if this one fails.
    pub fn downstream(&self, node_id: &str) -> Vec<NodeId> {
        self.walk(node_id, |node| self.children(node))
    }

    /// Get all upstream nodes (transitive closure of parents)
    pub fn upstream(&self, node_id: &str) -> Vec<NodeId> {
        self.walk(node_id, |node| self.parents(node))
    }

    /// Breadth-first walk from `start`, excluding `start` unless reachable again
    fn walk<'a>(&'a self, start: &str, next: impl Fn(&str) -> &'a [NodeId]) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&NodeId> = next(start).iter().collect();
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }

            result.push(current.clone());

            for node in next(current.as_str()) {
                if !visited.contains(node) {
                    queue.push_back(node);
                }
            }
        }

        result
    }

    /// Resolve a build order: every dependency before its dependents
    ///
    /// Depth-first over the nodes in discovery order, dependencies visited in
    /// name order, so the result is deterministic. Hitting a node that is
    /// still in progress means the graph has a cycle; no partial order is
    /// returned in that case.
    pub fn resolve_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut state = vec![Visit::Unvisited; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        // (node index, index of the next dependency to visit)
        let mut stack: Vec<(usize, usize)> = Vec::new();

        for root in 0..self.nodes.len() {
            if state[root] != Visit::Unvisited {
                continue;
            }

            state[root] = Visit::InProgress;
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let (node, next) = *frame;
                let deps = self.parents(&self.nodes[node]);

                let Some(dep) = deps.get(next) else {
                    state[node] = Visit::Done;
                    order.push(self.nodes[node].clone());
                    stack.pop();
                    continue;
                };

                frame.1 += 1;
                let dep = self.index[dep.as_str()];

                match state[dep] {
                    Visit::Done => {}
                    Visit::InProgress => return Err(self.cycle_error(&stack, dep)),
                    Visit::Unvisited => {
                        state[dep] = Visit::InProgress;
                        stack.push((dep, 0));
                    }
                }
            }
        }

        Ok(order)
    }

    /// The in-progress path from `closing` back to itself
    fn cycle_error(&self, stack: &[(usize, usize)], closing: usize) -> CycleError {
        let start = stack
            .iter()
            .position(|&(node, _)| node == closing)
            .unwrap_or(0);

        let cycle = stack[start..]
            .iter()
            .map(|&(node, _)| self.nodes[node].clone())
            .chain(std::iter::once(self.nodes[closing].clone()))
            .collect();

        CycleError { cycle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        DependencyGraph::from_edges(nodes.iter().copied(), edges.iter().copied())
    }

    fn position(order: &[NodeId], node: &str) -> usize {
        order.iter().position(|n| n == node).unwrap()
    }

    fn assert_respects_edges(graph: &DependencyGraph, order: &[NodeId]) {
        assert_eq!(order.len(), graph.len());
        for node in graph.nodes() {
            for dep in graph.parents(node) {
                assert!(
                    position(order, dep) < position(order, node),
                    "{} must come before {} in {:?}",
                    dep,
                    node,
                    order
                );
            }
        }
    }

    #[test]
    fn edges_to_unknown_nodes_are_dropped() {
        let g = graph(&["a", "b"], &[("b", "a"), ("b", "raw_input"), ("ghost", "a")]);

        assert_eq!(g.parents("b"), &["a".to_string()]);
        assert!(g.parents("a").is_empty());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut g = graph(&["a", "b"], &[]);
        assert!(g.add_edge("b", "a"));
        assert!(!g.add_edge("b", "a"));
        assert_eq!(g.children("a"), &["b".to_string()]);
    }

    #[test]
    fn linear_chain() {
        let g = graph(&["c", "b", "a"], &[("c", "b"), ("b", "a")]);
        assert_eq!(g.resolve_order().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond() {
        let g = graph(
            &["report", "left", "right", "base"],
            &[("report", "left"), ("report", "right"), ("left", "base"), ("right", "base")],
        );

        let order = g.resolve_order().unwrap();
        assert_respects_edges(&g, &order);
        assert_eq!(order, vec!["base", "left", "right", "report"]);
    }

    #[test]
    fn disconnected_nodes_keep_discovery_order() {
        let g = graph(&["x", "y", "z"], &[]);
        assert_eq!(g.resolve_order().unwrap(), vec!["x", "y", "z"]);
    }

    #[test]
    fn two_node_cycle() {
        let g = graph(&["x", "y"], &[("x", "y"), ("y", "x")]);

        let err = g.resolve_order().unwrap_err();
        assert_eq!(err.cycle, vec!["x", "y", "x"]);
        assert_eq!(err.unit(), "x");
        assert_eq!(err.to_string(), "cyclic dependency detected: x -> y -> x");
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let g = graph(&["a"], &[("a", "a")]);
        assert_eq!(g.resolve_order().unwrap_err().cycle, vec!["a", "a"]);
    }

    #[test]
    fn cycle_behind_acyclic_prefix() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("b", "c"), ("c", "d"), ("d", "b")],
        );

        assert_eq!(g.resolve_order().unwrap_err().cycle, vec!["b", "c", "d", "b"]);
    }

    #[test]
    fn resolution_is_repeatable() {
        let g = graph(
            &["e", "d", "c", "b", "a"],
            &[("e", "a"), ("d", "a"), ("d", "b"), ("c", "e"), ("b", "a")],
        );

        let first = g.resolve_order().unwrap();
        assert_respects_edges(&g, &first);
        assert_eq!(first, g.resolve_order().unwrap());
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let names: Vec<String> = (0..50_000).map(|i| format!("unit_{}", i)).collect();
        let edges = names.windows(2).map(|w| (w[0].clone(), w[1].clone()));
        let g = DependencyGraph::from_edges(names.clone(), edges);

        let order = g.resolve_order().unwrap();
        assert_eq!(order.first(), names.last());
        assert_eq!(order.last(), names.first());
    }

    #[test]
    fn downstream_and_upstream() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[("b", "a"), ("c", "b"), ("d", "a")],
        );

        let mut downstream = g.downstream("a");
        downstream.sort();
        assert_eq!(downstream, vec!["b", "c", "d"]);
        assert_eq!(g.upstream("c"), vec!["b", "a"]);
    }
}
