use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The complete, canonical definition of a workflow, ready for compilation.
///
/// Node order carries no meaning for the flow itself (edges define it), but it is
/// used as the tie-breaker wherever the compiler needs a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl WorkflowGraph {
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// A human-friendly name from `meta.name`, falling back to the graph id.
    pub fn display_name(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

/// A single unit of work: trigger, action, transform or condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NodeData>,
}

impl WorkflowNode {
    /// `true` when the node type starts with `condition`, ignoring case.
    pub fn is_condition(&self) -> bool {
        self.node_type
            .trim()
            .get(..9)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("condition"))
    }

    pub fn operation(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.operation.as_deref())
    }

    /// Merges `params`, `data.parameters` and `data.config` (later keys win).
    ///
    /// When only a single non-object value is present it is returned as-is;
    /// when nothing is present the result is an empty object.
    pub fn resolved_config(&self) -> Value {
        let data = self.data.as_ref();
        let layers: Vec<&Value> = [
            self.params.as_ref(),
            data.and_then(|d| d.parameters.as_ref()),
            data.and_then(|d| d.config.as_ref()),
        ]
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
        .collect();

        match layers.as_slice() {
            [] => Value::Object(Map::new()),
            [single] => (*single).clone(),
            _ => {
                let mut merged = Map::new();
                for layer in &layers {
                    if let Value::Object(fields) = layer {
                        for (key, value) in fields {
                            merged.insert(key.clone(), value.clone());
                        }
                    }
                }
                Value::Object(merged)
            }
        }
    }
}

/// Editor-provided payload attached to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Value>,
}

/// A directed link between two nodes, optionally carrying branch information.
///
/// Editors disagree on field names, so `from`/`to` and `default` are accepted
/// alongside `source`/`target` and `isDefault`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "from", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, alias = "to", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

impl Edge {
    pub fn new(id: &str, source: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source.as_deref().filter(|s| !s.is_empty())
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target.as_deref().filter(|s| !s.is_empty())
    }
}
