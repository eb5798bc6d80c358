use crate::graph::{Edge, WorkflowGraph};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::VecDeque;

/// Outgoing edges grouped by source node.
///
/// Only edges whose source and target both name existing nodes are indexed; the
/// rest are kept aside in `dangling` so they can be reported.
pub struct EdgeIndex<'g> {
    outgoing: AHashMap<&'g str, Vec<&'g Edge>>,
    dangling: Vec<&'g Edge>,
}

impl<'g> EdgeIndex<'g> {
    pub fn build(graph: &'g WorkflowGraph) -> Self {
        let known: AHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut outgoing: AHashMap<&'g str, Vec<&'g Edge>> = AHashMap::new();
        let mut dangling = Vec::new();

        for edge in &graph.edges {
            match (edge.source_id(), edge.target_id()) {
                (Some(source), Some(target)) if known.contains(source) && known.contains(target) => {
                    outgoing.entry(source).or_default().push(edge);
                }
                _ => dangling.push(edge),
            }
        }

        Self { outgoing, dangling }
    }

    pub fn outgoing(&self, node_id: &str) -> &[&'g Edge] {
        self.outgoing.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dangling(&self) -> &[&'g Edge] {
        &self.dangling
    }

    /// Every indexed edge, grouped by source.
    pub fn edges(&self) -> impl Iterator<Item = &'g Edge> + '_ {
        self.outgoing.values().flat_map(|edges| edges.iter().copied())
    }
}

/// The result of ordering a graph for emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    /// Every node id exactly once.
    pub order: Vec<String>,
    /// Nodes with no incoming indexed edge; they run unconditionally.
    pub roots: Vec<String>,
    /// Nodes the Kahn pass could not reach, appended to `order` in graph order.
    pub unresolved: Vec<String>,
}

/// Node ids in graph order, first occurrence wins.
fn node_ids(graph: &WorkflowGraph) -> Vec<&str> {
    graph.nodes.iter().map(|n| n.id.as_str()).unique().collect()
}

fn indegrees<'g>(graph: &'g WorkflowGraph, index: &EdgeIndex<'g>) -> AHashMap<&'g str, usize> {
    let mut indegree: AHashMap<&str, usize> =
        node_ids(graph).into_iter().map(|id| (id, 0)).collect();
    for edge in index.edges() {
        if let Some(count) = edge.target_id().and_then(|t| indegree.get_mut(t)) {
            *count += 1;
        }
    }
    indegree
}

/// Nodes with zero indegree, in graph order.
pub fn find_roots(graph: &WorkflowGraph, index: &EdgeIndex<'_>) -> Vec<String> {
    let indegree = indegrees(graph, index);
    node_ids(graph)
        .into_iter()
        .filter(|id| indegree.get(id).copied() == Some(0))
        .map(str::to_string)
        .collect()
}

/// Kahn's algorithm with leftover nodes appended in graph order.
///
/// Ties between simultaneously ready nodes follow queue insertion order, which starts
/// from graph order, so the same input always yields the same ordering.
pub fn order_nodes(graph: &WorkflowGraph, index: &EdgeIndex<'_>) -> Ordering {
    let ids = node_ids(graph);
    let mut indegree = indegrees(graph, index);
    let roots = find_roots(graph, index);

    let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();
    let mut visited: AHashSet<&str> = AHashSet::new();
    let mut order = Vec::with_capacity(ids.len());

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        order.push(id.to_string());
        for edge in index.outgoing(id) {
            let Some(target) = edge.target_id() else {
                continue;
            };
            if let Some(count) = indegree.get_mut(target) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    let unresolved: Vec<String> = ids
        .iter()
        .filter(|id| !visited.contains(*id))
        .map(|id| id.to_string())
        .collect();
    order.extend(unresolved.iter().cloned());

    tracing::debug!(
        nodes = order.len(),
        roots = roots.len(),
        unresolved = unresolved.len(),
        "ordered workflow nodes"
    );

    Ordering {
        order,
        roots,
        unresolved,
    }
}
