// Call graph structures for LegacyGraph.
// Function names are node keys; edges mean "caller calls callee".

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::domain::cycles;
use crate::domain::error::GraphError;

/// One function definition and the distinct callees found in its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller: String,
    pub callees: BTreeSet<String>,
}

impl CallRecord {
    pub fn new<I, S>(caller: impl Into<String>, callees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            caller: caller.into(),
            callees: callees.into_iter().map(Into::into).collect(),
        }
    }
}

/// Directed caller -> callee graph keyed by function name.
///
/// Functions that resolve to the same name share one node. Callees that
/// were never defined in the analyzed unit still become nodes, with no
/// outgoing edges.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fresh graph from extracted records.
    pub fn build(records: &[CallRecord]) -> Self {
        let mut graph = Self::new();
        for record in records {
            let caller = graph.add_function(&record.caller);
            for callee in &record.callees {
                let callee = graph.add_function(callee);
                graph.graph.update_edge(caller, callee, ());
            }
        }
        graph
    }

    /// Idempotent: returns the existing index when already present.
    fn add_function(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    fn lookup(&self, name: &str) -> Result<NodeIndex, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::not_found(name))
    }

    /// Neighbours in edge insertion order. petgraph walks adjacency lists
    /// newest-first, hence the reverse.
    fn neighbours(&self, idx: NodeIndex, dir: Direction) -> Vec<String> {
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        names.reverse();
        names
    }

    /// Direct callees of `name`.
    pub fn successors(&self, name: &str) -> Result<Vec<String>, GraphError> {
        let idx = self.lookup(name)?;
        Ok(self.neighbours(idx, Direction::Outgoing))
    }

    /// Direct callers of `name`.
    pub fn predecessors(&self, name: &str) -> Result<Vec<String>, GraphError> {
        let idx = self.lookup(name)?;
        Ok(self.neighbours(idx, Direction::Incoming))
    }

    /// Every known function, defined or merely called, in first-seen order.
    pub fn all_nodes(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All caller -> callee pairs.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| (self.graph[e.source()].clone(), self.graph[e.target()].clone()))
            .collect()
    }

    pub fn in_degree(&self, name: &str) -> Result<usize, GraphError> {
        let idx = self.lookup(name)?;
        Ok(self.graph.neighbors_directed(idx, Direction::Incoming).count())
    }

    pub fn out_degree(&self, name: &str) -> Result<usize, GraphError> {
        let idx = self.lookup(name)?;
        Ok(self.graph.neighbors_directed(idx, Direction::Outgoing).count())
    }

    /// Functions nobody calls (in-degree 0). Entry points such as `main`
    /// are included; filtering them is up to the caller.
    pub fn orphans(&self) -> BTreeSet<String> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].clone())
            .collect()
    }

    /// Every simple cycle, self-loops included as one-element cycles.
    ///
    /// Each cycle lists its distinct nodes in traversal order; append the
    /// first node to render a closed loop.
    pub fn detect_cycles(&self, max_cycles: Option<usize>) -> Result<Vec<Vec<String>>, GraphError> {
        let cycles = cycles::simple_cycles(&self.graph, max_cycles)?;
        Ok(cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|idx| self.graph[idx].clone()).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> DependencyGraph {
        DependencyGraph::build(&[
            CallRecord::new("C", Vec::<String>::new()),
            CallRecord::new("B", ["C"]),
            CallRecord::new("A", ["B"]),
        ])
    }

    #[test]
    fn test_build_linear_chain() {
        let graph = linear();
        assert_eq!(graph.successors("A").unwrap(), vec!["B"]);
        assert_eq!(graph.successors("B").unwrap(), vec!["C"]);
        assert!(graph.successors("C").unwrap().is_empty());
        assert_eq!(graph.predecessors("C").unwrap(), vec!["B"]);
        assert_eq!(graph.all_nodes(), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_callee_without_definition_becomes_node() {
        let graph = DependencyGraph::build(&[CallRecord::new("main", ["printf"])]);
        assert!(graph.contains("printf"));
        assert!(graph.successors("printf").unwrap().is_empty());
        assert_eq!(graph.predecessors("printf").unwrap(), vec!["main"]);
    }

    #[test]
    fn test_duplicate_records_merge_and_dedupe_edges() {
        let graph = DependencyGraph::build(&[
            CallRecord::new("f", ["g"]),
            CallRecord::new("f", ["g", "h"]),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.successors("f").unwrap(), vec!["g", "h"]);
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let graph = linear();
        assert!(matches!(
            graph.successors("missing"),
            Err(GraphError::NotFound { ref name }) if name == "missing"
        ));
        assert!(graph.predecessors("missing").is_err());
        assert!(graph.in_degree("missing").is_err());
    }

    #[test]
    fn test_no_callees_is_distinct_from_not_found() {
        let graph = linear();
        assert_eq!(graph.successors("C").unwrap(), Vec::<String>::new());
        assert!(graph.successors("D").is_err());
    }

    #[test]
    fn test_orphans_and_degrees() {
        let graph = DependencyGraph::build(&[
            CallRecord::new("orphan", Vec::<String>::new()),
            CallRecord::new("parent", ["child"]),
            CallRecord::new("child", Vec::<String>::new()),
        ]);
        let orphans: Vec<_> = graph.orphans().into_iter().collect();
        assert_eq!(orphans, vec!["orphan", "parent"]);
        assert_eq!(graph.in_degree("child").unwrap(), 1);
        assert_eq!(graph.out_degree("parent").unwrap(), 1);
    }

    #[test]
    fn test_self_loop_is_its_own_caller() {
        let graph = DependencyGraph::build(&[CallRecord::new("rec", ["rec"])]);
        assert_eq!(graph.predecessors("rec").unwrap(), vec!["rec"]);
        assert_eq!(graph.detect_cycles(None).unwrap(), vec![vec!["rec".to_string()]]);
        assert!(graph.orphans().is_empty());
    }

    #[test]
    fn test_edges_lists_pairs() {
        let graph = linear();
        let mut edges = graph.edges();
        edges.sort();
        assert_eq!(
            edges,
            vec![
                ("A".to_string(), "B".to_string()),
                ("B".to_string(), "C".to_string())
            ]
        );
    }
}
