use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::fs;

/// Options controlling how a workflow is compiled.
///
/// All fields have defaults, so a partial JSON document is a valid options file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Path of the primary script inside `CompileResult::files`.
    pub script_path: String,
    /// Name of the top-level function the host invokes to run the workflow.
    pub entry_function: String,
    /// Fail with `CompileError::CycleDetected` instead of appending cyclic nodes.
    pub strict_cycles: bool,
    /// Emit a comment line above every activation block.
    pub annotate: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            script_path: "Code.gs".to_string(),
            entry_function: "runWorkflow".to_string(),
            strict_cycles: false,
            annotate: true,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| CompileError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: &str) -> Result<Self, CompileError> {
        let content = fs::read_to_string(path)
            .map_err(|e| CompileError::Io(format!("Could not read options '{}': {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), CompileError> {
        if self.script_path.trim().is_empty() {
            return Err(CompileError::InvalidOptions(
                "scriptPath must not be empty".to_string(),
            ));
        }
        if !is_identifier(&self.entry_function) {
            return Err(CompileError::InvalidOptions(format!(
                "entryFunction '{}' is not a valid identifier",
                self.entry_function
            )));
        }
        if self.entry_function.starts_with("__flow") {
            return Err(CompileError::InvalidOptions(format!(
                "entryFunction '{}' collides with the runtime helper namespace",
                self.entry_function
            )));
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
