use super::definition::WorkflowGraph;
use crate::compiler::ExecutionPlan;
use crate::diagnostics::Diagnostic;
use crate::error::CompileError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// A single named text file produced by compilation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptFile {
    pub path: String,
    pub content: String,
}

/// Node counts by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileStats {
    pub nodes: usize,
    pub triggers: usize,
    pub actions: usize,
    pub transforms: usize,
    pub conditions: usize,
}

impl CompileStats {
    pub fn from_graph(graph: &WorkflowGraph) -> Self {
        let mut stats = Self {
            nodes: graph.nodes.len(),
            ..Default::default()
        };
        for node in &graph.nodes {
            if node.is_condition() {
                stats.conditions += 1;
                continue;
            }
            match node.node_type.trim().to_ascii_lowercase().as_str() {
                "trigger" => stats.triggers += 1,
                "action" => stats.actions += 1,
                "transform" => stats.transforms += 1,
                _ => {}
            }
        }
        stats
    }
}

/// Everything a compilation run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileResult {
    pub workflow_id: String,
    /// The prepared graph: value wrappers unwrapped, references encoded as placeholders.
    pub graph: WorkflowGraph,
    pub stats: CompileStats,
    pub files: Vec<ScriptFile>,
    pub plan: ExecutionPlan,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileResult {
    pub fn file(&self, path: &str) -> Option<&ScriptFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// The primary script is always the first file.
    pub fn script(&self) -> &str {
        self.files.first().map(|f| f.content.as_str()).unwrap_or_default()
    }

    /// Writes every produced file below `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<(), CompileError> {
        fs::create_dir_all(dir).map_err(|e| {
            CompileError::Io(format!("Could not create directory '{}': {}", dir.display(), e))
        })?;
        for file in &self.files {
            let target = dir.join(&file.path);
            fs::write(&target, &file.content).map_err(|e| {
                CompileError::Io(format!("Could not write file '{}': {}", target.display(), e))
            })?;
        }
        Ok(())
    }
}
