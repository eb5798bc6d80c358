use super::definition::WorkflowGraph;
use crate::error::GraphConversionError;

/// A trait for editor data models that can be converted into a `WorkflowGraph`.
///
/// This is the extension point that keeps the compiler independent of any single
/// editor format. Implement it on your own structs to hand them to the compiler.
///
/// # Example
///
/// ```rust,no_run
/// use flowscript::error::GraphConversionError;
/// use flowscript::graph::{IntoWorkflow, WorkflowGraph, WorkflowNode};
///
/// struct MyStep { id: String, action: String }
/// struct MyAutomation { steps: Vec<MyStep> }
///
/// impl IntoWorkflow for MyAutomation {
///     fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError> {
///         let nodes = self
///             .steps
///             .into_iter()
///             .map(|step| WorkflowNode {
///                 id: step.id,
///                 node_type: "action".to_string(),
///                 op: Some(step.action),
///                 ..Default::default()
///             })
///             .collect();
///
///         Ok(WorkflowGraph { id: "my-automation".to_string(), nodes, ..Default::default() })
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a compilable workflow graph.
    fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError>;
}

impl IntoWorkflow for WorkflowGraph {
    fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError> {
        Ok(self)
    }
}

impl IntoWorkflow for serde_json::Value {
    fn into_workflow(self) -> Result<WorkflowGraph, GraphConversionError> {
        if !self.is_object() {
            return Err(GraphConversionError::ValidationError(
                "workflow document must be a JSON object".to_string(),
            ));
        }
        let graph: WorkflowGraph = serde_json::from_value(self)
            .map_err(|e| GraphConversionError::ValidationError(e.to_string()))?;

        if let Some(node) = graph.nodes.iter().find(|n| n.id.trim().is_empty()) {
            return Err(GraphConversionError::ValidationError(format!(
                "node of type '{}' has an empty id",
                node.node_type
            )));
        }
        Ok(graph)
    }
}
