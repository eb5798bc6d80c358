use super::branching::BranchMapping;
use super::registry::config_literal;
use crate::graph::WorkflowNode;
use crate::reference::{PLACEHOLDER_PREFIX, js_string};
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

/// How a block hands control to its successors once its node has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Activation {
    /// Activate every direct successor.
    All { targets: Vec<String> },
    /// Activate only the successors whose branch matches the node's decision.
    Branch { branches: Vec<BranchMapping> },
}

impl Activation {
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Activation::All { targets } => targets.iter().map(String::as_str).collect(),
            Activation::Branch { branches } => {
                branches.iter().map(|b| b.target_id.as_str()).collect()
            }
        }
    }
}

/// One guarded block of the generated entry function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationBlock {
    pub node_id: String,
    pub node_type: String,
    pub function_name: String,
    /// Operation key the body was generated from; `None` for condition nodes.
    pub operation_key: Option<String>,
    pub activation: Activation,
}

/// Builds a unique script identifier for the node at `position` in emission order.
pub fn function_name(position: usize, node_id: &str) -> String {
    let slug: String = node_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(40)
        .collect();
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        format!("step_{}", position)
    } else {
        format!("step_{}_{}", position, slug)
    }
}

/// Wraps a generator body into a top-level function.
pub fn emit_node_function(name: &str, node: &WorkflowNode, body: &str, annotate: bool) -> String {
    let mut out = String::new();
    if annotate {
        let _ = writeln!(
            out,
            "// node {} ({})",
            comment_text(&node.id),
            comment_text(&node.node_type)
        );
    }
    let _ = writeln!(out, "function {}(ctx) {{", name);
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// The rule of a condition node: `data.rule`, else `rule`/`condition`/`expression`
/// from its configuration, else `false`.
pub fn condition_rule(node: &WorkflowNode, config: &Value) -> Value {
    node.data
        .as_ref()
        .and_then(|d| d.rule.clone())
        .or_else(|| {
            ["rule", "condition", "expression"]
                .iter()
                .find_map(|key| config.get(*key).cloned())
        })
        .unwrap_or(Value::Bool(false))
}

/// Body of a synthesized condition function.
///
/// Evaluation failures are captured rather than thrown; the decision then falls to `'false'`.
pub fn condition_body(rule: &Value) -> String {
    format!(
        r#"  var rule = {rule};
  var result = false;
  var error = null;
  try {{
    result = __flowEvaluateRule(rule, ctx);
  }} catch (e) {{
    result = false;
    error = String(e && e.message ? e.message : e);
  }}
  return __flowAssign(ctx, {{ matchedBranch: __flowBranchKey(result), conditionResult: result, conditionError: error }});
"#,
        rule = config_literal(rule)
    )
}

/// Renders one activation-guarded block.
pub fn emit_block(block: &ActivationBlock, annotate: bool) -> String {
    let id = js_string(&block.node_id);
    let mut out = String::new();

    if annotate {
        let _ = writeln!(
            out,
            "  // node {} ({})",
            comment_text(&block.node_id),
            comment_text(&block.node_type)
        );
    }
    let _ = writeln!(out, "  if (__flowState[{}] === 'active') {{", id);

    match &block.activation {
        Activation::All { targets } => {
            let _ = writeln!(out, "    try {{");
            let _ = writeln!(out, "      ctx = {}(ctx);", block.function_name);
            let _ = writeln!(out, "    }} catch (e) {{");
            let _ = writeln!(out, "      ctx = __flowFail(ctx, {}, e);", id);
            let _ = writeln!(out, "    }}");
            let _ = writeln!(out, "    __flowStore({}, ctx);", id);
            let _ = writeln!(out, "    __flowState[{}] = 'done';", id);
            for target in targets {
                let _ = writeln!(out, "    __flowActivate({});", js_string(target));
            }
        }
        Activation::Branch { branches } => {
            let _ = writeln!(out, "    branch = 'false';");
            let _ = writeln!(out, "    try {{");
            let _ = writeln!(out, "      ctx = {}(ctx);", block.function_name);
            let _ = writeln!(out, "      branch = __flowBranchKey(ctx && ctx.matchedBranch);");
            let _ = writeln!(out, "    }} catch (e) {{");
            let _ = writeln!(out, "      ctx = __flowFail(ctx, {}, e);", id);
            let _ = writeln!(out, "    }}");
            let _ = writeln!(out, "    __flowStore({}, ctx);", id);
            let _ = writeln!(out, "    __flowState[{}] = 'done';", id);
            out.push_str(&emit_branch_selection(branches));
        }
    }

    out.push_str("  }\n");
    out
}

fn emit_branch_selection(branches: &[BranchMapping]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "    matched = false;");

    for (value, group) in &branches
        .iter()
        .filter_map(|b| b.value.as_deref().map(|v| (v, b)))
        .chunk_by(|(value, _)| *value)
    {
        let _ = write!(out, "    if (branch === {}) {{ ", js_string(value));
        for (_, branch) in group {
            let _ = write!(out, "__flowActivate({}); ", js_string(&branch.target_id));
        }
        let _ = writeln!(out, "matched = true; }}");
    }

    let defaults: Vec<&BranchMapping> = branches.iter().filter(|b| b.is_default).collect();
    if !defaults.is_empty() {
        let _ = write!(out, "    if (!matched) {{ ");
        for branch in defaults {
            let _ = write!(out, "__flowActivate({}); ", js_string(&branch.target_id));
        }
        let _ = writeln!(out, "matched = true; }}");
    }

    if let [only] = branches {
        let _ = writeln!(
            out,
            "    if (!matched) {{ __flowActivate({}); }}",
            js_string(&only.target_id)
        );
    }
    out
}

/// Renders the entry function that seeds the roots and runs every block in order.
pub fn emit_entry_function(entry: &str, roots: &[String], blocks: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "function {}(input) {{", entry);
    let _ = writeln!(out, "  __flowOutputs = {{}};");
    let _ = writeln!(out, "  __flowState = {{}};");
    let _ = writeln!(out, "  var ctx = input === undefined || input === null ? {{}} : input;");
    let _ = writeln!(out, "  var branch = 'false';");
    let _ = writeln!(out, "  var matched = false;");
    for root in roots {
        let _ = writeln!(out, "  __flowActivate({});", js_string(root));
    }
    for block in blocks {
        out.push('\n');
        out.push_str(block);
    }
    let _ = writeln!(out, "\n  return ctx;");
    out.push_str("}\n");
    out
}

/// Makes user text safe to place in a `//` comment.
pub fn comment_text(text: &str) -> String {
    text.replace(['\r', '\n', '\u{2028}', '\u{2029}'], " ")
        .replace(PLACEHOLDER_PREFIX, "__FLOW REF__")
}
