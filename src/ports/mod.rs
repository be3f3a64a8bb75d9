use crate::domain::callgraph::{CallRecord, DependencyGraph};
use crate::domain::error::ExtractError;

/// Turns one unit of source text into per-definition call records.
pub trait CallExtractor {
    fn extract(&mut self, source: &str) -> Result<Vec<CallRecord>, ExtractError>;
}

/// Renders a built graph to a file or stream.
pub trait GraphExporter {
    fn render(&self, graph: &DependencyGraph) -> anyhow::Result<String>;

    fn export(&self, graph: &DependencyGraph, path: &str) -> anyhow::Result<()> {
        let content = self.render(graph)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
