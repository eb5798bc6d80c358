use super::emitter::{Activation, ActivationBlock};
use serde::Serialize;
use std::fmt::{self, Write};

/// The static shape of a compiled workflow: which blocks run in which order and how
/// each one hands control to its successors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub workflow_id: String,
    pub entry_function: String,
    pub order: Vec<String>,
    pub roots: Vec<String>,
    /// Nodes appended after the Kahn pass because they sit on a cycle.
    pub unresolved: Vec<String>,
    pub blocks: Vec<ActivationBlock>,
}

impl ExecutionPlan {
    pub fn block(&self, node_id: &str) -> Option<&ActivationBlock> {
        self.blocks.iter().find(|b| b.node_id == node_id)
    }

    /// Ids of every node the block of `node_id` may activate.
    pub fn successors(&self, node_id: &str) -> Vec<&str> {
        self.block(node_id)
            .map(|b| b.activation.targets())
            .unwrap_or_default()
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&visualize_plan(self))
    }
}

/// Formats an `ExecutionPlan` into a human-readable listing for debugging.
pub fn visualize_plan(plan: &ExecutionPlan) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "======== EXECUTION PLAN for Workflow: {} ========",
        plan.workflow_id
    );
    let _ = writeln!(output, "entry: {}()", plan.entry_function);
    let _ = writeln!(output, "roots: [{}]", plan.roots.join(", "));
    if !plan.unresolved.is_empty() {
        let _ = writeln!(output, "unresolved: [{}]", plan.unresolved.join(", "));
    }

    let _ = writeln!(output, "\n--- BLOCKS ---");
    for (position, block) in plan.blocks.iter().enumerate() {
        let operation = block.operation_key.as_deref().unwrap_or("condition");
        let _ = writeln!(
            output,
            "{:04}: {:<24} {:<20} -> {}",
            position, block.node_id, operation, block.function_name
        );
        format_activation(&mut output, &block.activation);
    }

    let _ = writeln!(output, "\n================ END OF PLAN ================");
    output
}

fn format_activation(output: &mut String, activation: &Activation) {
    match activation {
        Activation::All { targets } if targets.is_empty() => {
            let _ = writeln!(output, "      (end)");
        }
        Activation::All { targets } => {
            for target in targets {
                let _ = writeln!(output, "      => {}", target);
            }
        }
        Activation::Branch { branches } => {
            for branch in branches {
                let value = branch.value.as_deref().unwrap_or("<none>");
                let marker = if branch.is_default { " (default)" } else { "" };
                let label = branch
                    .label
                    .as_deref()
                    .map(|l| format!(" \"{}\"", l))
                    .unwrap_or_default();
                let _ = writeln!(
                    output,
                    "      [{}]{}{} => {}",
                    value, label, marker, branch.target_id
                );
            }
        }
    }
}
