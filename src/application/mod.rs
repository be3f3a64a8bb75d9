pub mod session;

pub use session::GraphSession;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::callgraph::{CallRecord, DependencyGraph};
use crate::domain::error::ExtractError;
use crate::ports::{CallExtractor, GraphExporter};

/// One-shot analysis of a set of source files.
///
/// Each file is extracted on a rayon worker with its own extractor (parsers
/// are not shareable across threads); records are then concatenated in
/// input order and built into a single graph.
pub struct AnalyzeUsecase<'a, F> {
    pub extractor_factory: F,
    pub exporter: &'a dyn GraphExporter,
}

impl<'a, F, X> AnalyzeUsecase<'a, F>
where
    F: Fn() -> Result<X, ExtractError> + Sync + Send,
    X: CallExtractor,
{
    pub fn extract_all(&self, sources: &[(String, String)]) -> Result<Vec<CallRecord>, ExtractError> {
        let factory = &self.extractor_factory;
        let per_file: Vec<Vec<CallRecord>> = sources
            .par_iter()
            .map_init(
                || factory(),
                |extractor, (path, code)| {
                    let extractor = extractor.as_mut().map_err(|e| e.clone())?;
                    extractor.extract(code).map_err(|e| {
                        warn!(path = %path, error = %e, "extraction failed");
                        e
                    })
                },
            )
            .collect::<Result<_, _>>()?;

        Ok(per_file.into_iter().flatten().collect())
    }

    pub fn build_graph(&self, sources: &[(String, String)]) -> Result<DependencyGraph, ExtractError> {
        let records = self.extract_all(sources)?;
        let graph = DependencyGraph::build(&records);
        info!(
            files = sources.len(),
            definitions = records.len(),
            functions = graph.node_count(),
            calls = graph.edge_count(),
            "graph built"
        );
        Ok(graph)
    }

    /// Build the graph and render it with the configured exporter.
    pub fn render(&self, sources: &[(String, String)]) -> anyhow::Result<String> {
        let graph = self.build_graph(sources)?;
        self.exporter.render(&graph)
    }

    pub fn run(&self, sources: &[(String, String)], export_path: &str) -> anyhow::Result<()> {
        let graph = self.build_graph(sources)?;
        self.exporter.export(&graph, export_path)
    }
}
