//! Long-lived analysis state for the tool layer.
//!
//! A session owns one extractor and the current graph. Builds are
//! serialised through the extractor mutex and only swap the graph in once
//! they have fully succeeded; queries take a read lock and may run in
//! parallel with each other.

use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{error, info};

use crate::config::EngineConfig;
use crate::domain::callgraph::DependencyGraph;
use crate::domain::error::{AnalysisError, ExtractError, GraphError};
use crate::infrastructure::TreeSitterCppExtractor;
use crate::ports::CallExtractor;

pub struct GraphSession {
    extractor: Mutex<Box<dyn CallExtractor + Send>>,
    graph: RwLock<DependencyGraph>,
    config: EngineConfig,
}

impl GraphSession {
    pub fn new(extractor: Box<dyn CallExtractor + Send>, config: EngineConfig) -> Self {
        Self {
            extractor: Mutex::new(extractor),
            graph: RwLock::new(DependencyGraph::new()),
            config,
        }
    }

    /// Session backed by the tree-sitter C/C++ extractor.
    pub fn cpp(config: EngineConfig) -> Result<Self, ExtractError> {
        let extractor = TreeSitterCppExtractor::new()?;
        Ok(Self::new(Box::new(extractor), config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rebuild the graph from `source`, replacing the previous one.
    /// Returns the number of functions in the new graph. On failure the
    /// previous graph is left untouched.
    pub fn analyze(&self, source: &str) -> Result<usize, AnalysisError> {
        let mut extractor = self.extractor.lock().unwrap_or_else(PoisonError::into_inner);

        let records = extractor.extract(source).map_err(|e| {
            error!(error = %e, "analysis failed");
            e
        })?;
        let graph = DependencyGraph::build(&records);
        let functions = graph.node_count();
        let calls = graph.edge_count();

        *self.graph.write().unwrap_or_else(PoisonError::into_inner) = graph;
        drop(extractor);

        info!(
            definitions = records.len(),
            functions, calls, "graph rebuilt"
        );
        Ok(functions)
    }

    /// Run `f` against the current graph under a read lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&DependencyGraph) -> R) -> R {
        let graph = self.graph.read().unwrap_or_else(PoisonError::into_inner);
        f(&graph)
    }

    pub fn function_count(&self) -> usize {
        self.with_graph(|g| g.node_count())
    }

    pub fn callees(&self, name: &str) -> Result<Vec<String>, GraphError> {
        self.with_graph(|g| g.successors(name))
    }

    pub fn callers(&self, name: &str) -> Result<Vec<String>, GraphError> {
        self.with_graph(|g| g.predecessors(name))
    }

    pub fn cycles(&self) -> Result<Vec<Vec<String>>, GraphError> {
        let max_cycles = self.config.max_cycles;
        self.with_graph(|g| g.detect_cycles(max_cycles))
    }

    pub fn orphans(&self) -> BTreeSet<String> {
        self.with_graph(|g| g.orphans())
    }
}
