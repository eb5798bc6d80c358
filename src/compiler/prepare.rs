use crate::graph::{NodeData, WorkflowGraph, WorkflowNode};
use crate::reference;
use serde_json::{Map, Value};

/// Returns a copy of `graph` whose configuration trees are safe to stringify.
///
/// Static wrappers are unwrapped and reference wrappers become placeholder strings.
/// Edges without an id get a positional one so branch mappings can always name them.
pub(crate) fn prepare_graph(graph: &WorkflowGraph) -> WorkflowGraph {
    let nodes = graph.nodes.iter().map(prepare_node).collect();
    let edges = graph
        .edges
        .iter()
        .enumerate()
        .map(|(index, edge)| {
            let mut edge = edge.clone();
            if edge.id.trim().is_empty() {
                edge.id = format!("edge-{}", index);
            }
            edge
        })
        .collect();

    WorkflowGraph {
        id: graph.id.clone(),
        nodes,
        edges,
        meta: graph.meta.clone(),
    }
}

fn prepare_node(node: &WorkflowNode) -> WorkflowNode {
    WorkflowNode {
        params: node.params.as_ref().map(prepare_value),
        data: node.data.as_ref().map(|data| NodeData {
            config: data.config.as_ref().map(prepare_value),
            parameters: data.parameters.as_ref().map(prepare_value),
            rule: data.rule.as_ref().map(prepare_value),
            ..data.clone()
        }),
        ..node.clone()
    }
}

/// Recursively replaces value wrappers inside a configuration tree.
pub fn prepare_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(prepare_value).collect()),
        Value::Object(fields) => match wrapper_mode(fields) {
            Some(Mode::Static) => fields.get("value").map(prepare_value).unwrap_or(Value::Null),
            Some(Mode::Ref) => match fields.get("nodeId").and_then(Value::as_str) {
                Some(node_id) => {
                    let path = fields.get("path").and_then(Value::as_str).unwrap_or("");
                    Value::String(reference::encode(node_id, path))
                }
                None => Value::Null,
            },
            None => Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), prepare_value(value)))
                    .collect::<Map<_, _>>(),
            ),
        },
        other => other.clone(),
    }
}

enum Mode {
    Static,
    Ref,
}

fn wrapper_mode(fields: &Map<String, Value>) -> Option<Mode> {
    match fields.get("mode").and_then(Value::as_str) {
        Some(mode) if mode.eq_ignore_ascii_case("static") => Some(Mode::Static),
        Some(mode) if mode.eq_ignore_ascii_case("ref") => Some(Mode::Ref),
        _ => None,
    }
}
