//! Tree-sitter backed C/C++ call extraction.
//!
//! Definitions are located with a query rather than by walking top-level
//! items, so functions nested inside namespaces, classes or error-recovery
//! nodes are still found.

use std::collections::BTreeSet;

use tree_sitter::{Node, Parser, Query, QueryCursor};
use tracing::debug;

use crate::domain::callgraph::CallRecord;
use crate::domain::declarator::{resolve_function_name, SyntaxView};
use crate::domain::error::ExtractError;
use crate::ports::CallExtractor;

const DEFINITION_QUERY: &str = "(function_definition) @function";
const CALL_QUERY: &str = "(call_expression) @call";

/// A tree-sitter node paired with the source it was parsed from.
#[derive(Clone, Copy)]
pub struct TsNode<'t> {
    node: Node<'t>,
    source: &'t [u8],
}

impl<'t> TsNode<'t> {
    pub fn new(node: Node<'t>, source: &'t [u8]) -> Self {
        Self { node, source }
    }
}

impl<'t> SyntaxView for TsNode<'t> {
    fn kind(&self) -> &str {
        self.node.kind()
    }

    fn field(&self, name: &str) -> Option<Self> {
        self.node
            .child_by_field_name(name)
            .map(|node| TsNode::new(node, self.source))
    }

    fn text(&self) -> Option<&str> {
        self.node.utf8_text(self.source).ok()
    }

    fn last_named_child(&self) -> Option<Self> {
        let last = self.node.named_child_count().checked_sub(1)?;
        self.node
            .named_child(last)
            .map(|node| TsNode::new(node, self.source))
    }
}

/// C/C++ extractor. Holds a parser bound to the C++ grammar and the two
/// compiled queries; not `Sync`, so use one per thread.
pub struct TreeSitterCppExtractor {
    parser: Parser,
    definition_query: Query,
    call_query: Query,
}

impl TreeSitterCppExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let language: tree_sitter::Language = tree_sitter_cpp::LANGUAGE.into();

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ExtractError::Configuration(format!("failed to set language: {}", e)))?;

        let definition_query = Query::new(&language, DEFINITION_QUERY).map_err(|e| {
            ExtractError::Configuration(format!("failed to compile definition query: {}", e))
        })?;
        let call_query = Query::new(&language, CALL_QUERY).map_err(|e| {
            ExtractError::Configuration(format!("failed to compile call query: {}", e))
        })?;

        Ok(Self {
            parser,
            definition_query,
            call_query,
        })
    }

    /// Distinct callee texts of every call expression under `definition`.
    fn callees(&self, definition: Node<'_>, source: &[u8]) -> BTreeSet<String> {
        let mut cursor = QueryCursor::new();
        let mut callees = BTreeSet::new();

        for m in cursor.matches(&self.call_query, definition, source) {
            for capture in m.captures {
                let Some(function) = capture.node.child_by_field_name("function") else {
                    continue;
                };
                match function.utf8_text(source) {
                    Ok(text) => {
                        callees.insert(text.to_string());
                    }
                    Err(e) => debug!(error = %e, "skipping callee with non-UTF-8 text"),
                }
            }
        }

        callees
    }
}

impl CallExtractor for TreeSitterCppExtractor {
    fn extract(&mut self, source: &str) -> Result<Vec<CallRecord>, ExtractError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractError::Parse("parser produced no tree".to_string()))?;
        let root = tree.root_node();
        let bytes = source.as_bytes();

        if root.has_error() {
            debug!("source contains syntax errors, extracting recoverable definitions");
        }

        let mut definitions = Vec::new();
        let mut cursor = QueryCursor::new();
        for m in cursor.matches(&self.definition_query, root, bytes) {
            definitions.extend(m.captures.iter().map(|c| c.node));
        }

        let mut records = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let Some(caller) = resolve_function_name(&TsNode::new(definition, bytes)) else {
                debug!(
                    line = definition.start_position().row + 1,
                    "skipping function definition without a resolvable name"
                );
                continue;
            };
            let callees = self.callees(definition, bytes);
            records.push(CallRecord { caller, callees });
        }

        debug!(records = records.len(), "extraction finished");
        Ok(records)
    }
}
