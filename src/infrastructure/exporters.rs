//! Graph exporters: plain-text report, Graphviz DOT and JSON.

use std::collections::HashSet;

use anyhow::Context;

use crate::api::dto::{render_cycle, GraphDto};
use crate::config::EngineConfig;
use crate::domain::callgraph::DependencyGraph;
use crate::ports::GraphExporter;

/// Human-readable summary: callees per function, cycles and orphans.
pub struct TextExporter {
    pub config: EngineConfig,
}

impl GraphExporter for TextExporter {
    fn render(&self, graph: &DependencyGraph) -> anyhow::Result<String> {
        let mut lines = vec![format!(
            "Graph built with {} functions and {} calls.",
            graph.node_count(),
            graph.edge_count()
        )];

        lines.push(String::new());
        for name in graph.all_nodes() {
            let callees = graph.successors(&name)?;
            if callees.is_empty() {
                lines.push(format!("Function '{}' does not call any other functions.", name));
            } else {
                lines.push(format!("Function '{}' calls: {}", name, callees.join(", ")));
            }
        }

        lines.push(String::new());
        let cycles = graph.detect_cycles(self.config.max_cycles)?;
        if cycles.is_empty() {
            lines.push("No circular dependencies detected.".to_string());
        } else {
            lines.push("Circular dependencies detected:".to_string());
            lines.extend(cycles.iter().map(|c| format!("- {}", render_cycle(c))));
        }

        let orphans = graph.orphans();
        if orphans.is_empty() {
            lines.push("No orphan functions found.".to_string());
        } else {
            let orphans: Vec<String> = orphans.into_iter().collect();
            lines.push(format!("Orphan functions (never called): {}", orphans.join(", ")));
        }

        lines.push(String::new());
        Ok(lines.join("\n"))
    }
}

/// Graphviz digraph. Orphans are drawn dashed, functions on a cycle red.
pub struct DotExporter {
    pub config: EngineConfig,
}

impl DotExporter {
    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl GraphExporter for DotExporter {
    fn render(&self, graph: &DependencyGraph) -> anyhow::Result<String> {
        let on_cycle: HashSet<String> = graph
            .detect_cycles(self.config.max_cycles)?
            .into_iter()
            .flatten()
            .collect();
        let orphans = graph.orphans();

        let mut lines = vec![
            "digraph CallGraph {".to_string(),
            "    rankdir=LR;".to_string(),
            "    node [shape=box, fontname=\"Helvetica\", fontsize=12];".to_string(),
            String::new(),
        ];

        for name in graph.all_nodes() {
            let mut attrs = Vec::new();
            if on_cycle.contains(&name) {
                attrs.push("color=\"#d20f39\"");
            }
            if orphans.contains(&name) {
                attrs.push("style=dashed");
            }
            let id = Self::escape_label(&name);
            if attrs.is_empty() {
                lines.push(format!("    \"{}\";", id));
            } else {
                lines.push(format!("    \"{}\" [{}];", id, attrs.join(", ")));
            }
        }

        lines.push(String::new());
        for (from, to) in graph.edges() {
            lines.push(format!(
                "    \"{}\" -> \"{}\";",
                Self::escape_label(&from),
                Self::escape_label(&to)
            ));
        }

        lines.push("}".to_string());
        Ok(lines.join("\n"))
    }
}

pub struct JsonExporter {
    pub config: EngineConfig,
}

impl GraphExporter for JsonExporter {
    fn render(&self, graph: &DependencyGraph) -> anyhow::Result<String> {
        let dto = GraphDto::from_graph(graph, self.config.max_cycles)?;
        serde_json::to_string_pretty(&dto).context("Failed to serialize graph")
    }
}
