//! Prelude module for convenient imports
//!
//! Re-exports the types needed to load, configure and compile a workflow.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowscript::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let graph: WorkflowGraph = serde_json::from_str(&std::fs::read_to_string("workflow.json")?)?;
//! let result = Compiler::builder(graph).build().compile()?;
//! println!("{}", result.script());
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{
    Compiler, CompilerBuilder, ExecutionPlan, GeneratorInput, NodeGenerator, config_literal,
};
pub use crate::config::CompileOptions;

// Graph model
pub use crate::graph::{
    CompileResult, CompileStats, Edge, IntoWorkflow, NodeData, ScriptFile, WorkflowGraph,
    WorkflowNode,
};

// Diagnostics and errors
pub use crate::diagnostics::{Diagnostic, DiagnosticKind};
pub use crate::error::{CompileError, GraphConversionError};

pub use std::path::Path;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
