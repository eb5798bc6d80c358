use super::topology::EdgeIndex;
use crate::graph::{Edge, WorkflowNode};
use serde::Serialize;
use serde_json::Value;

pub const TRUE_KEY: &str = "true";
pub const FALSE_KEY: &str = "false";

/// Normalized decision data for one outgoing edge of a condition node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchMapping {
    pub edge_id: String,
    pub target_id: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub is_default: bool,
}

impl BranchMapping {
    /// A branch that can never be selected at runtime.
    pub fn is_unmatchable(&self) -> bool {
        self.value.is_none() && !self.is_default
    }
}

/// Resolves the branch mapping of every indexed outgoing edge of `node`.
///
/// With exactly two edges, a blank value falls back to `true` for the first edge and
/// `false` for the second. Single-branch conditions always fire; a two-branch condition
/// where neither value is `true`/`false` is forced to that pair by position.
pub fn resolve_branches(node: &WorkflowNode, index: &EdgeIndex<'_>) -> Vec<BranchMapping> {
    let edges = index.outgoing(&node.id);
    let binary = edges.len() == 2;

    let mut branches: Vec<BranchMapping> = edges
        .iter()
        .enumerate()
        .filter_map(|(position, edge)| {
            let fallback = match position {
                0 if binary => Some(TRUE_KEY),
                1 if binary => Some(FALSE_KEY),
                _ => None,
            };
            map_edge(edge, fallback)
        })
        .collect();

    match branches.as_mut_slice() {
        [only] => {
            only.value.get_or_insert_with(|| TRUE_KEY.to_string());
            only.is_default = true;
        }
        [first, second] if !is_boolean_key(&first.value) && !is_boolean_key(&second.value) => {
            first.value = Some(TRUE_KEY.to_string());
            second.value = Some(FALSE_KEY.to_string());
        }
        _ => {}
    }

    branches
}

fn is_boolean_key(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some(TRUE_KEY | FALSE_KEY))
}

fn map_edge(edge: &Edge, fallback: Option<&str>) -> Option<BranchMapping> {
    let target_id = edge.target_id()?.to_string();
    let data = edge.data.as_ref();
    let condition = edge.condition.as_ref();

    let label = first_text([
        edge.label.as_ref().map(|s| Value::String(s.clone())).as_ref(),
        data.and_then(|d| d.get("label")),
        edge.branch_label.as_ref().map(|s| Value::String(s.clone())).as_ref(),
        data.and_then(|d| d.get("branchLabel")),
        condition.and_then(|c| c.get("label")),
    ]);

    let raw = [
        edge.branch_value.as_ref(),
        data.and_then(|d| d.get("branchValue")),
        condition.and_then(|c| c.get("value")),
    ]
    .into_iter()
    .flatten()
    .find(|v| !is_blank(v))
    .cloned()
    .or_else(|| label.clone().map(Value::String));

    let default_marked = [
        edge.is_default.as_ref(),
        edge.default.as_ref(),
        data.and_then(|d| d.get("isDefault")),
        data.and_then(|d| d.get("default")),
        condition.and_then(|c| c.get("isDefault")),
        condition.and_then(|c| c.get("default")),
    ]
    .into_iter()
    .flatten()
    .any(is_truthy);
    let raw_is_default = raw
        .as_ref()
        .and_then(Value::as_str)
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("default"));

    Some(BranchMapping {
        edge_id: edge.id.clone(),
        target_id,
        label,
        value: normalize_branch_value(raw.as_ref(), fallback),
        is_default: default_marked || raw_is_default,
    })
}

/// Normalizes a raw branch value into a branch key.
///
/// Booleans and the recognized truthy/falsy tokens become `"true"`/`"false"`,
/// blank input takes `fallback`, and anything else passes through trimmed.
pub fn normalize_branch_value(raw: Option<&Value>, fallback: Option<&str>) -> Option<String> {
    let text = match raw {
        None | Some(Value::Null) => return fallback.map(str::to_string),
        Some(Value::Bool(b)) => return Some(if *b { TRUE_KEY } else { FALSE_KEY }.to_string()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    };
    if text.is_empty() {
        return fallback.map(str::to_string);
    }
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "y" => Some(TRUE_KEY.to_string()),
        "false" | "no" | "0" | "n" => Some(FALSE_KEY.to_string()),
        _ => Some(text),
    }
}

fn first_text<'a>(candidates: impl IntoIterator<Item = Option<&'a Value>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1" | "y"),
        _ => false,
    }
}
