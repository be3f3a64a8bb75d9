use serde::{Deserialize, Serialize};

use crate::domain::callgraph::DependencyGraph;
use crate::domain::error::GraphError;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    pub callers: usize,
    pub callees: usize,
    pub orphan: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub type_: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CyclesDto {
    pub cycles: Vec<Vec<String>>,
    pub rendered: Vec<String>,
}

impl CyclesDto {
    pub fn new(cycles: Vec<Vec<String>>) -> Self {
        let rendered = cycles.iter().map(|c| render_cycle(c)).collect();
        Self { cycles, rendered }
    }
}

impl GraphDto {
    pub fn from_graph(graph: &DependencyGraph, max_cycles: Option<usize>) -> Result<Self, GraphError> {
        let mut nodes = Vec::with_capacity(graph.node_count());
        for id in graph.all_nodes() {
            let callers = graph.in_degree(&id)?;
            let callees = graph.out_degree(&id)?;
            nodes.push(NodeDto {
                id,
                callers,
                callees,
                orphan: callers == 0,
            });
        }

        let edges = graph
            .edges()
            .into_iter()
            .map(|(from, to)| EdgeDto {
                from,
                to,
                type_: "call".to_string(),
            })
            .collect();

        Ok(GraphDto {
            nodes,
            edges,
            cycles: graph.detect_cycles(max_cycles)?,
        })
    }
}

/// `["A", "B"]` -> `"A -> B -> A"`; a self-loop renders as `"A -> A"`.
pub fn render_cycle(cycle: &[String]) -> String {
    match cycle.first() {
        Some(first) => {
            let mut parts: Vec<&str> = cycle.iter().map(String::as_str).collect();
            parts.push(first);
            parts.join(" -> ")
        }
        None => String::new(),
    }
}
