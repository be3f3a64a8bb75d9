//! Error taxonomy for extraction, graph queries and whole analyses.

use thiserror::Error;

/// Failures raised while turning source text into call records.
///
/// Malformed source is not an error: the parser recovers and extraction
/// yields whatever well-formed definitions it finds.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// The grammar could not be bound or a query failed to compile.
    #[error("parser configuration failed: {0}")]
    Configuration(String),

    /// The parser itself faulted on the supplied text.
    #[error("parsing failed: {0}")]
    Parse(String),
}

/// Failures raised by queries over a built graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Function '{name}' not found in graph.")]
    NotFound { name: String },

    #[error("Cycle detection failed: {0}")]
    Algorithm(String),
}

impl GraphError {
    pub fn not_found(name: &str) -> Self {
        GraphError::NotFound {
            name: name.to_string(),
        }
    }
}

/// Anything that can go wrong during an analyze-and-query round trip.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl AnalysisError {
    /// Stable machine-readable tag used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Extract(ExtractError::Configuration(_)) => "configuration",
            AnalysisError::Extract(ExtractError::Parse(_)) => "parse_failure",
            AnalysisError::Graph(GraphError::NotFound { .. }) => "not_found",
            AnalysisError::Graph(GraphError::Algorithm(_)) => "graph_algorithm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_function() {
        let err = GraphError::not_found("funcA");
        assert_eq!(err.to_string(), "Function 'funcA' not found in graph.");
    }

    #[test]
    fn test_kind_tags() {
        let err: AnalysisError = GraphError::not_found("x").into();
        assert_eq!(err.kind(), "not_found");

        let err: AnalysisError = ExtractError::Parse("boom".into()).into();
        assert_eq!(err.kind(), "parse_failure");
        assert_eq!(err.to_string(), "parsing failed: boom");
    }
}
