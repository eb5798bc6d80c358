//! Common test utilities for building workflow graphs.
use flowscript::prelude::*;
use serde_json::{Value, json};

#[allow(dead_code)]
pub fn node(id: &str, node_type: &str, op: Option<&str>) -> WorkflowNode {
    WorkflowNode {
        id: id.to_string(),
        node_type: node_type.to_string(),
        op: op.map(str::to_string),
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn node_with_config(id: &str, op: &str, config: Value) -> WorkflowNode {
    WorkflowNode {
        data: Some(NodeData {
            config: Some(config),
            ..Default::default()
        }),
        ..node(id, "action", Some(op))
    }
}

#[allow(dead_code)]
pub fn condition(id: &str, rule: Value) -> WorkflowNode {
    WorkflowNode {
        data: Some(NodeData {
            rule: Some(rule),
            ..Default::default()
        }),
        ..node(id, "condition.if", None)
    }
}

#[allow(dead_code)]
pub fn graph(id: &str, nodes: Vec<WorkflowNode>, edges: Vec<Edge>) -> WorkflowGraph {
    WorkflowGraph {
        id: id.to_string(),
        nodes,
        edges,
        meta: None,
    }
}

/// Scenario A: a trigger feeding one action.
#[allow(dead_code)]
pub fn create_linear_graph() -> WorkflowGraph {
    graph(
        "linear",
        vec![
            node("trigger", "trigger", None),
            node_with_config("action", "core.log", json!({ "message": "hello" })),
        ],
        vec![Edge::new("e1", "trigger", "action")],
    )
}

/// Scenario B: trigger -> condition with "Yes"/"No" edges to two actions.
#[allow(dead_code)]
pub fn create_condition_graph() -> WorkflowGraph {
    graph(
        "approval",
        vec![
            node("trigger", "trigger", None),
            condition("check", json!("ctx.total > 10")),
            node("approve", "action", Some("core.noop")),
            node("reject", "action", Some("core.noop")),
        ],
        vec![
            Edge::new("e1", "trigger", "check"),
            Edge::new("e2", "check", "approve").with_label("Yes"),
            Edge::new("e3", "check", "reject").with_label("No"),
        ],
    )
}

/// Scenario C: a `core.set` node reading the e-mail address produced by `n1`.
#[allow(dead_code)]
pub fn create_reference_graph() -> WorkflowGraph {
    graph(
        "refs",
        vec![
            node("n1", "trigger", None),
            node_with_config(
                "compose",
                "core.set",
                json!({
                    "values": {
                        "to": { "mode": "ref", "nodeId": "n1", "path": "$.user.email" },
                        "subject": { "mode": "static", "value": "Welcome" }
                    }
                }),
            ),
        ],
        vec![Edge::new("e1", "n1", "compose")],
    )
}

/// Scenario D: one edge points at a node that does not exist.
#[allow(dead_code)]
pub fn create_dangling_graph() -> WorkflowGraph {
    graph(
        "dangling",
        vec![
            node("start", "trigger", None),
            node("work", "action", Some("core.noop")),
        ],
        vec![
            Edge::new("e1", "start", "work"),
            Edge::new("e2", "work", "ghost"),
        ],
    )
}

/// `start -> loop_a <-> loop_b -> end`
#[allow(dead_code)]
pub fn create_cyclic_graph() -> WorkflowGraph {
    graph(
        "cyclic",
        vec![
            node("start", "trigger", None),
            node("loop_b", "action", Some("core.noop")),
            node("loop_a", "action", Some("core.noop")),
            node("end", "action", Some("core.noop")),
        ],
        vec![
            Edge::new("e1", "start", "loop_a"),
            Edge::new("e2", "loop_a", "loop_b"),
            Edge::new("e3", "loop_b", "loop_a"),
            Edge::new("e4", "loop_b", "end"),
        ],
    )
}

#[allow(dead_code)]
pub fn compile(graph: WorkflowGraph) -> CompileResult {
    Compiler::builder(graph)
        .build()
        .compile()
        .expect("compilation should succeed")
}

/// The text of the activation block guarded by `node_id`, up to the next block.
#[allow(dead_code)]
pub fn block_text<'a>(script: &'a str, node_id: &str) -> &'a str {
    let guard = format!("if (__flowState[\"{}\"] === 'active')", node_id);
    let start = script
        .find(&guard)
        .unwrap_or_else(|| panic!("no block for {node_id}"));
    let rest = &script[start + guard.len()..];
    let end = rest
        .find("if (__flowState[")
        .or_else(|| rest.find("return ctx;"))
        .unwrap_or(rest.len());
    &script[start..start + guard.len() + end]
}

/// Runs `script`, calls `entry` with `input` and returns the final context together
/// with the stored outputs and activation state.
#[allow(dead_code)]
pub fn run_workflow(script: &str, entry: &str, input: Value) -> Value {
    let code = format!(
        "{script}\nJSON.stringify({{ result: {entry}({input}), outputs: __flowOutputs, state: __flowState }});"
    );
    eval_json(&code)
}

/// Evaluates JavaScript whose completion value is a JSON string and parses it.
#[allow(dead_code)]
pub fn eval_json(code: &str) -> Value {
    let mut context = boa_engine::Context::default();
    let value = context
        .eval(boa_engine::Source::from_bytes(code))
        .unwrap_or_else(|e| panic!("script failed: {e}"));
    let text = value
        .as_string()
        .expect("script should complete with a JSON string")
        .to_std_string_escaped();
    serde_json::from_str(&text).expect("completion value should be valid JSON")
}
