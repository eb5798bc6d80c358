//! # flowscript - Workflow Graph to Script Compiler
//!
//! **flowscript** compiles node-and-edge workflow graphs, as drawn in a visual
//! automation editor, into a single self-contained script for a synchronous,
//! single-threaded scripting host.
//!
//! ## Core Workflow
//!
//! 1.  **Load Your Graph**: Deserialize a `WorkflowGraph` directly, or implement
//!     `IntoWorkflow` for your editor's own data model.
//! 2.  **Configure**: Use `Compiler::builder` to set `CompileOptions`, register custom
//!     `NodeGenerator`s, or alias editor-specific operation keys to built-in ones.
//! 3.  **Compile**: `compile()` orders the nodes, resolves condition branches, emits one
//!     activation-guarded block per node and rewrites every cross-node reference into a
//!     runtime lookup. The result holds the script file, an `ExecutionPlan` and any
//!     diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowscript::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let json = std::fs::read_to_string("path/to/workflow.json")?;
//!
//!     let compiler = Compiler::from_json(&json)?
//!         .with_options(CompileOptions {
//!             entry_function: "main".to_string(),
//!             ..Default::default()
//!         })
//!         .with_operation_alias("gmail.sendemail", "core.log")
//!         .build();
//!
//!     let result = compiler.compile()?;
//!     for diagnostic in &result.diagnostics {
//!         eprintln!("warning: {}", diagnostic);
//!     }
//!     result.write_to(Path::new("dist"))?;
//!     println!("{}", result.plan);
//!     Ok(())
//! }
//! ```
//!
//! ## Cross-node references
//!
//! A configuration value `{"mode": "ref", "nodeId": "n1", "path": "$.user.email"}` reads
//! `user.email` from the output node `n1` stored when it ran. See [`reference`] for the
//! placeholder protocol that carries these through code generation.

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod reference;
