//! Property tests for ordering, branch resolution and the reference protocol.
mod common;
use common::*;
use flowscript::compiler::branching::{normalize_branch_value, resolve_branches};
use flowscript::compiler::prepare::prepare_value;
use flowscript::compiler::registry::{normalize_key, operation_key};
use flowscript::compiler::topology::{EdgeIndex, find_roots, order_nodes};
use flowscript::prelude::*;
use flowscript::reference::{
    PLACEHOLDER_PREFIX, decode, encode, is_placeholder, js_string, normalize_path,
    resolve_placeholders,
};
use itertools::Itertools;
use serde_json::{Value, json};

/// A layered DAG whose node list is deliberately reversed.
fn layered_dag() -> (WorkflowGraph, Vec<(String, String)>) {
    let layers = [vec!["a"], vec!["b", "c", "d"], vec!["e", "f"], vec!["g"]];
    let mut edges = Vec::new();
    for (upper, lower) in layers.iter().tuple_windows() {
        for (i, source) in upper.iter().enumerate() {
            for (j, target) in lower.iter().enumerate() {
                if (i + j) % 2 == 0 || lower.len() == 1 {
                    edges.push((source.to_string(), target.to_string()));
                }
            }
        }
    }
    edges.push(("a".to_string(), "g".to_string()));

    let nodes = layers
        .iter()
        .flatten()
        .rev()
        .map(|id| node(id, "action", Some("core.noop")))
        .collect();
    let graph_edges = edges
        .iter()
        .enumerate()
        .map(|(i, (s, t))| Edge::new(&format!("e{i}"), s, t))
        .collect();
    (graph("dag", nodes, graph_edges), edges)
}

#[test]
fn test_order_is_consistent_with_every_edge() {
    let (g, edges) = layered_dag();
    let index = EdgeIndex::build(&g);
    let ordering = order_nodes(&g, &index);

    assert!(ordering.unresolved.is_empty());
    let position = |id: &str| ordering.order.iter().position(|n| n == id).unwrap();
    for (u, v) in &edges {
        assert!(position(u) < position(v), "{u} must precede {v}");
    }
}

#[test]
fn test_order_covers_every_node_once_even_with_cycles() {
    let mut g = create_cyclic_graph();
    g.edges.push(Edge::new("self", "end", "end"));
    let index = EdgeIndex::build(&g);
    let ordering = order_nodes(&g, &index);

    let mut sorted = ordering.order.clone();
    sorted.sort();
    let mut expected: Vec<String> = g.nodes.iter().map(|n| n.id.clone()).collect();
    expected.sort();
    assert_eq!(sorted, expected);
    assert!(ordering.order.iter().all_unique());
}

#[test]
fn test_roots_have_no_incoming_edges() {
    let mut g = create_dangling_graph();
    g.nodes.push(node("orphan", "action", Some("core.noop")));
    // An edge from a missing node does not count towards indegree.
    g.edges.push(Edge::new("e3", "nowhere", "orphan"));
    let index = EdgeIndex::build(&g);

    assert_eq!(find_roots(&g, &index), vec!["start", "orphan"]);
    assert_eq!(index.dangling().len(), 2);
}

#[test]
fn test_single_branch_law() {
    for label in [None, Some("No"), Some("Approved"), Some("false")] {
        let mut edge = Edge::new("e1", "c", "a");
        edge.label = label.map(str::to_string);
        let g = graph(
            "single",
            vec![condition("c", json!(false)), node("a", "action", None)],
            vec![edge],
        );
        let index = EdgeIndex::build(&g);
        let branches = resolve_branches(&g.nodes[0], &index);

        assert_eq!(branches.len(), 1);
        assert!(branches[0].is_default, "label {label:?}");
        assert!(branches[0].value.is_some(), "label {label:?}");
    }

    let g = graph(
        "single",
        vec![condition("c", json!(false)), node("a", "action", None)],
        vec![Edge::new("e1", "c", "a")],
    );
    let index = EdgeIndex::build(&g);
    assert_eq!(resolve_branches(&g.nodes[0], &index)[0].value.as_deref(), Some("true"));
}

#[test]
fn test_binary_branch_law() {
    let pairs = [
        (None, None),
        (Some("Approved"), Some("Rejected")),
        (Some("Yes"), Some("No")),
    ];
    for (first, second) in pairs {
        let mut e1 = Edge::new("e1", "c", "a");
        e1.label = first.map(str::to_string);
        let mut e2 = Edge::new("e2", "c", "b");
        e2.label = second.map(str::to_string);
        let g = graph(
            "binary",
            vec![
                condition("c", json!(true)),
                node("a", "action", None),
                node("b", "action", None),
            ],
            vec![e1, e2],
        );
        let index = EdgeIndex::build(&g);
        let values: Vec<_> = resolve_branches(&g.nodes[0], &index)
            .into_iter()
            .map(|b| b.value)
            .collect();
        assert_eq!(
            values,
            vec![Some("true".to_string()), Some("false".to_string())],
            "labels {first:?}/{second:?}"
        );
    }
}

#[test]
fn test_placeholder_round_trip_through_prepared_config() {
    let config = json!({ "mode": "ref", "nodeId": "n-1", "path": "$.rows[3].id" });
    let prepared = prepare_value(&config);
    let token = prepared.as_str().unwrap();
    let reference = decode(token).unwrap();
    assert_eq!(reference.node_id, "n-1");
    assert_eq!(reference.path, "$.rows[3].id");
    assert_eq!(reference.to_lookup_expression(), r#"__flowLookup("n-1", "rows.3.id")"#);
}

#[test]
fn test_quote_boundary_safety() {
    let token = encode("n1", "a.b");
    let text = format!(
        "log({token}); x = '{token}\"; y = \"see {token}\"; z = `{token}`;"
    );
    let resolved = resolve_placeholders(&text);

    assert_eq!(resolved.resolved, 1);
    let expected = format!(
        "log({token}); x = '{token}\"; y = \"see {token}\"; z = __flowLookup(\"n1\", \"a.b\");"
    );
    assert_eq!(resolved.text, expected);
}

#[test]
fn test_resolution_without_prefix_is_identity() {
    let script = compile(create_linear_graph()).script().to_string();
    assert_eq!(resolve_placeholders(&script).text, script);
}

#[test]
fn test_error_messages() {
    let err = CompileError::CycleDetected {
        node_ids: vec!["a".to_string(), "b".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "Workflow contains a cycle that cannot be ordered: a, b"
    );
    let err: CompileError = GraphConversionError::ValidationError("bad".to_string()).into();
    assert!(matches!(err, CompileError::JsonParseError(_)));
}

/// Branch values of a condition `c` whose outgoing edges carry `labels`, in order.
fn branch_values(labels: &[Option<&str>]) -> Vec<Option<String>> {
    let mut nodes = vec![condition("c", json!(true))];
    let mut edges = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        let target = format!("t{i}");
        nodes.push(node(&target, "action", None));
        let mut edge = Edge::new(&format!("e{i}"), "c", &target);
        edge.label = label.map(str::to_string);
        edges.push(edge);
    }
    let g = graph("branches", nodes, edges);
    let index = EdgeIndex::build(&g);
    resolve_branches(&g.nodes[0], &index)
        .into_iter()
        .map(|b| b.value)
        .collect()
}

fn keys(values: &[&str]) -> Vec<Option<String>> {
    values.iter().map(|v| Some(v.to_string())).collect()
}

#[test]
fn test_binary_blank_value_falls_back_by_position() {
    assert_eq!(branch_values(&[None, Some("yes")]), keys(&["true", "true"]));
    assert_eq!(branch_values(&[Some("high"), None]), keys(&["high", "false"]));
    assert_eq!(branch_values(&[Some("No"), None]), keys(&["false", "false"]));
    assert_eq!(branch_values(&[Some("high"), Some("low")]), keys(&["true", "false"]));
}

#[test]
fn test_positional_fallback_needs_exactly_two_edges() {
    assert_eq!(branch_values(&[None, None, None]), vec![None, None, None]);
    assert_eq!(
        branch_values(&[Some("a"), Some("Yes"), None]),
        vec![Some("a".to_string()), Some("true".to_string()), None]
    );
}

#[test]
fn test_branch_value_priority_and_default_markers() {
    let mut valued = Edge::new("e1", "c", "a").with_label("Approve");
    valued.data = Some(json!({ "branchValue": "  " }));
    valued.condition = Some(json!({ "value": "N" }));
    let mut fallback = Edge::new("e2", "c", "b");
    fallback.data = Some(json!({ "isDefault": "yes" }));
    let mut third = Edge::new("e3", "c", "d");
    third.branch_value = Some(json!("Default"));

    let g = graph(
        "priority",
        vec![
            condition("c", json!(true)),
            node("a", "action", None),
            node("b", "action", None),
            node("d", "action", None),
        ],
        vec![valued, fallback, third],
    );
    let index = EdgeIndex::build(&g);
    let branches = resolve_branches(&g.nodes[0], &index);

    assert_eq!(branches[0].label.as_deref(), Some("Approve"));
    assert_eq!(branches[0].value.as_deref(), Some("false"));
    assert!(!branches[0].is_default);
    assert_eq!(branches[1].value, None);
    assert!(branches[1].is_default);
    assert!(!branches[1].is_unmatchable());
    assert!(branches[2].is_default);
    assert_eq!(branches[2].value.as_deref(), Some("Default"));
}

#[test]
fn test_normalize_branch_value() {
    let cases = [
        (Some(json!(true)), None, Some("true")),
        (Some(json!(false)), Some("true"), Some("false")),
        (Some(json!(" Y ")), None, Some("true")),
        (Some(json!("NO")), None, Some("false")),
        (Some(json!(1)), None, Some("true")),
        (Some(json!(0)), None, Some("false")),
        (Some(json!(2)), None, Some("2")),
        (Some(json!(" high ")), None, Some("high")),
        (Some(json!("")), Some("false"), Some("false")),
        (Some(Value::Null), Some("true"), Some("true")),
        (None, None, None),
    ];
    for (raw, fallback, expected) in cases {
        assert_eq!(
            normalize_branch_value(raw.as_ref(), fallback).as_deref(),
            expected,
            "raw {raw:?}"
        );
    }
}

#[test]
fn test_order_roots_match_root_finder() {
    let mut g = create_cyclic_graph();
    g.nodes.push(node("solo", "action", Some("core.noop")));
    g.edges.push(Edge::new("e9", "missing", "end"));
    let index = EdgeIndex::build(&g);
    let ordering = order_nodes(&g, &index);

    assert_eq!(ordering.roots, find_roots(&g, &index));
    assert_eq!(ordering.roots, vec!["start", "solo"]);
    assert_eq!(ordering.order, vec!["start", "solo", "loop_b", "loop_a", "end"]);
    assert_eq!(ordering.unresolved, vec!["loop_b", "loop_a", "end"]);
}

#[test]
fn test_ready_nodes_follow_graph_order() {
    let g = graph(
        "ties",
        vec![
            node("z", "action", None),
            node("root", "trigger", None),
            node("y", "action", None),
            node("x", "action", None),
        ],
        vec![
            Edge::new("e1", "root", "x"),
            Edge::new("e2", "root", "z"),
            Edge::new("e3", "root", "y"),
        ],
    );
    let index = EdgeIndex::build(&g);
    let ordering = order_nodes(&g, &index);
    // Successors are queued in edge order once their last incoming edge is consumed.
    assert_eq!(ordering.order, vec!["root", "x", "z", "y"]);
}

#[test]
fn test_duplicate_node_ids_are_ordered_once() {
    let g = graph(
        "dupes",
        vec![node("a", "trigger", None), node("a", "action", None), node("b", "action", None)],
        vec![Edge::new("e1", "a", "b")],
    );
    let index = EdgeIndex::build(&g);
    assert_eq!(order_nodes(&g, &index).order, vec!["a", "b"]);
}

#[test]
fn test_normalize_path() {
    let cases = [
        ("", ""),
        ("$", ""),
        ("$.", ""),
        ("$.user.email", "user.email"),
        ("$.items[0].name", "items.0.name"),
        ("rows[2][1]", "rows.2.1"),
        (" a..b ", "a.b"),
    ];
    for (path, expected) in cases {
        assert_eq!(normalize_path(path), expected, "path {path:?}");
    }
}

#[test]
fn test_placeholder_detection_and_malformed_payloads() {
    let token = encode("n1", "$.a");
    assert!(is_placeholder(&token));
    assert!(!is_placeholder(PLACEHOLDER_PREFIX));
    assert!(!is_placeholder(&format!("x{token}")));
    assert_eq!(decode(&format!("{PLACEHOLDER_PREFIX}not-base64!")), None);
    assert_eq!(decode(&format!("{PLACEHOLDER_PREFIX}bm90IGpzb24")), None);

    let text = format!("a = '{PLACEHOLDER_PREFIX}bm90IGpzb24'; b = \"{PLACEHOLDER_PREFIX}\";");
    let resolved = resolve_placeholders(&text);
    assert_eq!(resolved.text, format!("a = undefined; b = \"{PLACEHOLDER_PREFIX}\";"));
    assert_eq!(resolved.resolved, 1);
    assert_eq!(resolved.malformed.len(), 1);
}

#[test]
fn test_resolution_is_idempotent() {
    let text = format!("var x = [\"{}\", '{}'];", encode("a", "p"), encode("b", "$"));
    let once = resolve_placeholders(&text);
    assert_eq!(once.resolved, 2);
    assert_eq!(
        once.text,
        r#"var x = [__flowLookup("a", "p"), __flowLookup("b", "")];"#
    );
    assert_eq!(resolve_placeholders(&once.text).text, once.text);
}

#[test]
fn test_string_literals_cannot_forge_placeholders() {
    let id = format!("{}{}", PLACEHOLDER_PREFIX, "eyJub2RlSWQiOiJ4In0");
    let literal = js_string(&id);
    assert!(!literal.contains(PLACEHOLDER_PREFIX));
    assert_eq!(resolve_placeholders(&literal).resolved, 0);
    assert_eq!(js_string("say \"hi\"\n"), r#""say \"hi\"\n""#);
}

#[test]
fn test_prepare_value_unwraps_and_encodes() {
    let prepared = prepare_value(&json!({
        "a": { "mode": "static", "value": { "mode": "STATIC", "value": 3 } },
        "b": [{ "mode": "ref", "nodeId": "n1" }, { "mode": "ref" }],
        "c": { "mode": "other", "value": 1 },
        "d": { "mode": "static" }
    }));

    assert_eq!(prepared["a"], json!(3));
    assert_eq!(decode(prepared["b"][0].as_str().unwrap()).unwrap().path, "");
    assert_eq!(prepared["b"][1], Value::Null);
    assert_eq!(prepared["c"], json!({ "mode": "other", "value": 1 }));
    assert_eq!(prepared["d"], Value::Null);
}

#[test]
fn test_operation_key_priority() {
    let mut n = node("n", "Action", Some(" HTTP:Request "));
    n.app = Some("mail".to_string());
    assert_eq!(operation_key(&n).as_deref(), Some("http.request"));

    n.op = Some("  ".to_string());
    n.data = Some(NodeData {
        operation: Some("Send".to_string()),
        ..Default::default()
    });
    assert_eq!(operation_key(&n).as_deref(), Some("mail.send"));

    n.app = None;
    assert_eq!(operation_key(&n).as_deref(), Some("send"));

    n.data = None;
    assert_eq!(operation_key(&n).as_deref(), Some("action"));

    n.node_type = " ".to_string();
    assert_eq!(operation_key(&n), None);
    assert_eq!(normalize_key(" Core/Set "), "core.set");
}

#[test]
fn test_options_defaults_and_validation() {
    let defaults = CompileOptions::default();
    assert_eq!(defaults.script_path, "Code.gs");
    assert_eq!(defaults.entry_function, "runWorkflow");
    assert!(!defaults.strict_cycles);
    assert!(defaults.annotate);

    let partial = CompileOptions::from_json(r#"{ "entryFunction": "main", "annotate": false }"#)
        .unwrap();
    assert_eq!(partial.entry_function, "main");
    assert_eq!(partial.script_path, "Code.gs");
    assert!(!partial.annotate);

    for bad in [
        r#"{ "entryFunction": "1run" }"#,
        r#"{ "entryFunction": "__flowRun" }"#,
        r#"{ "scriptPath": " " }"#,
        r#"{ "annotate": "yes" }"#,
    ] {
        assert!(
            matches!(CompileOptions::from_json(bad), Err(CompileError::InvalidOptions(_))),
            "{bad}"
        );
    }
}
