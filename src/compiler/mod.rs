use crate::config::CompileOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::CompileError;
use crate::graph::{
    CompileResult, CompileStats, IntoWorkflow, ScriptFile, WorkflowGraph, WorkflowNode,
};
use crate::reference::resolve_placeholders;
use ahash::AHashMap;
use serde_json::Value;

pub mod branching;
pub mod emitter;
pub mod plan;
pub mod prepare;
pub mod registry;
pub mod runtime;
pub mod topology;

use branching::resolve_branches;
use emitter::{Activation, ActivationBlock, comment_text};
use topology::{EdgeIndex, order_nodes};

pub use plan::{ExecutionPlan, visualize_plan};
pub use registry::{GeneratorInput, GeneratorRegistry, NodeGenerator, config_literal};

pub struct Compiler {
    graph: WorkflowGraph,
    options: CompileOptions,
    registry: GeneratorRegistry,
}

pub struct CompilerBuilder {
    graph: WorkflowGraph,
    options: CompileOptions,
    registry: GeneratorRegistry,
}

impl CompilerBuilder {
    pub fn new(graph: WorkflowGraph) -> Self {
        Self {
            graph,
            options: CompileOptions::default(),
            registry: GeneratorRegistry::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Maps an editor-specific operation key onto one of the built-in generators.
    pub fn with_operation_alias(mut self, user_key: &str, builtin_key: &str) -> Self {
        if !self.registry.alias(user_key, builtin_key) {
            tracing::warn!(
                user_key,
                builtin_key,
                "ignoring alias to an unknown built-in generator"
            );
        }
        self
    }

    /// Registers a generator, replacing any existing one for the same operation key.
    pub fn with_generator(mut self, generator: Box<dyn NodeGenerator>) -> Self {
        self.registry.register(generator);
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            graph: self.graph,
            options: self.options,
            registry: self.registry,
        }
    }
}

impl Compiler {
    pub fn builder(graph: WorkflowGraph) -> CompilerBuilder {
        CompilerBuilder::new(graph)
    }

    /// Parses a workflow document and returns a builder for it.
    pub fn from_json(json: &str) -> Result<CompilerBuilder, CompileError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))?;
        Ok(CompilerBuilder::new(document.into_workflow()?))
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles the workflow into a single script.
    ///
    /// Irregular input (dangling edges, unknown operations, cycles in tolerant mode,
    /// broken references) is reported through `CompileResult::diagnostics`. Only invalid
    /// options and, with `strict_cycles`, a cyclic graph are errors.
    pub fn compile(&self) -> Result<CompileResult, CompileError> {
        self.options.validate()?;

        let graph = prepare::prepare_graph(&self.graph);
        tracing::info!(
            workflow = %graph.display_name(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "compiling workflow"
        );

        let index = EdgeIndex::build(&graph);
        let mut diagnostics: Vec<Diagnostic> = index
            .dangling()
            .iter()
            .map(|edge| {
                let endpoints: Vec<String> = [edge.source_id(), edge.target_id()]
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect();
                Diagnostic::new(
                    DiagnosticKind::DanglingEdge,
                    format!(
                        "Edge '{}' ({} -> {}) references a missing node and was ignored",
                        edge.id,
                        edge.source_id().unwrap_or("?"),
                        edge.target_id().unwrap_or("?")
                    ),
                    endpoints,
                )
            })
            .collect();

        let ordering = order_nodes(&graph, &index);
        if !ordering.unresolved.is_empty() {
            if self.options.strict_cycles {
                return Err(CompileError::CycleDetected {
                    node_ids: ordering.unresolved,
                });
            }
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnresolvedCycle,
                format!(
                    "Nodes on a cycle were appended in graph order and may never run: {}",
                    ordering.unresolved.join(", ")
                ),
                ordering.unresolved.clone(),
            ));
        }

        let mut nodes: AHashMap<&str, &WorkflowNode> = AHashMap::new();
        for node in &graph.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        let annotate = self.options.annotate;
        let mut functions = Vec::with_capacity(ordering.order.len());
        let mut blocks = Vec::with_capacity(ordering.order.len());

        for (position, node_id) in ordering.order.iter().enumerate() {
            let Some(node) = nodes.get(node_id.as_str()).copied() else {
                continue;
            };
            let function_name = emitter::function_name(position, node_id);
            let config = node.resolved_config();

            let (body, operation_key, activation) = if node.is_condition() {
                let branches = resolve_branches(node, &index);
                for branch in branches.iter().filter(|b| b.is_unmatchable()) {
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnmatchableBranch,
                        format!(
                            "Branch '{}' of condition '{}' has no value and is not a default; it can never fire",
                            branch.edge_id, node.id
                        ),
                        vec![node.id.clone(), branch.target_id.clone()],
                    ));
                }
                let rule = emitter::condition_rule(node, &config);
                (
                    emitter::condition_body(&rule),
                    None,
                    Activation::Branch { branches },
                )
            } else {
                let key = registry::operation_key(node).unwrap_or_default();
                let input = GeneratorInput {
                    node,
                    key: &key,
                    config: &config,
                };
                let body = match self.registry.get(&key) {
                    Some(generator) => generator.generate(&input),
                    None => {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticKind::UnknownOperation,
                            format!(
                                "No generator for operation '{}' on node '{}'; using the fallback",
                                key, node.id
                            ),
                            vec![node.id.clone()],
                        ));
                        self.registry.fallback().generate(&input)
                    }
                };
                let targets = index
                    .outgoing(node_id)
                    .iter()
                    .filter_map(|edge| edge.target_id())
                    .map(str::to_string)
                    .collect();
                (body, Some(key), Activation::All { targets })
            };

            functions.push(emitter::emit_node_function(
                &function_name,
                node,
                &body,
                annotate,
            ));
            blocks.push(ActivationBlock {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                function_name,
                operation_key,
                activation,
            });
        }
        tracing::debug!(blocks = blocks.len(), "emitted activation blocks");

        let rendered: Vec<String> = blocks
            .iter()
            .map(|block| emitter::emit_block(block, annotate))
            .collect();
        let script = self.assemble(&graph, &functions, &ordering.roots, &rendered);

        let resolved = resolve_placeholders(&script);
        for token in &resolved.malformed {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::MalformedReference,
                format!("Reference placeholder '{}' could not be decoded", token),
                Vec::new(),
            ));
        }
        tracing::debug!(
            resolved = resolved.resolved,
            malformed = resolved.malformed.len(),
            "resolved reference placeholders"
        );

        let plan = ExecutionPlan {
            workflow_id: graph.id.clone(),
            entry_function: self.options.entry_function.clone(),
            order: ordering.order,
            roots: ordering.roots,
            unresolved: ordering.unresolved,
            blocks,
        };

        tracing::info!(
            workflow = %graph.id,
            bytes = resolved.text.len(),
            diagnostics = diagnostics.len(),
            "compilation finished"
        );

        Ok(CompileResult {
            workflow_id: graph.id.clone(),
            stats: CompileStats::from_graph(&graph),
            files: vec![ScriptFile {
                path: self.options.script_path.clone(),
                content: resolved.text,
            }],
            plan,
            diagnostics,
            graph,
        })
    }

    fn assemble(
        &self,
        graph: &WorkflowGraph,
        functions: &[String],
        roots: &[String],
        blocks: &[String],
    ) -> String {
        let mut script = String::new();
        script.push_str("// Generated by flowscript. Do not edit by hand.\n");
        script.push_str(&format!(
            "// Workflow: {} ({})\n\n",
            comment_text(graph.display_name()),
            comment_text(&graph.id)
        ));
        script.push_str(runtime::RUNTIME_HELPERS);
        for function in functions {
            script.push('\n');
            script.push_str(function);
        }
        script.push('\n');
        script.push_str(&emitter::emit_entry_function(
            &self.options.entry_function,
            roots,
            blocks,
        ));
        script
    }
}
