use thiserror::Error;

/// Errors that can occur during the workflow compilation phase.
///
/// Most graph irregularities are not errors: dangling edges, unknown operations and
/// malformed reference payloads are reported as diagnostics on the compile result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Failed to parse workflow JSON: {0}")]
    JsonParseError(String),

    #[error("Workflow contains a cycle that cannot be ordered: {}", .node_ids.join(", "))]
    CycleDetected { node_ids: Vec<String> },

    #[error("Invalid compile options: {0}")]
    InvalidOptions(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors that can occur when converting a custom editor format into a `WorkflowGraph`.
#[derive(Error, Debug, Clone)]
pub enum GraphConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}

impl From<GraphConversionError> for CompileError {
    fn from(err: GraphConversionError) -> Self {
        CompileError::JsonParseError(err.to_string())
    }
}
