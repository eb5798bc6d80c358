use serde::Serialize;
use std::fmt;

/// The category of a non-fatal compilation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// An edge was dropped because its source or target is missing.
    DanglingEdge,
    /// Nodes could not be ordered by the Kahn pass and were appended afterwards.
    UnresolvedCycle,
    /// No generator is registered for the node's operation key; the fallback was used.
    UnknownOperation,
    /// A condition branch carries no value and is not a default, so it can never fire.
    UnmatchableBranch,
    /// A reference placeholder payload could not be decoded.
    MalformedReference,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DanglingEdge => "dangling-edge",
            DiagnosticKind::UnresolvedCycle => "unresolved-cycle",
            DiagnosticKind::UnknownOperation => "unknown-operation",
            DiagnosticKind::UnmatchableBranch => "unmatchable-branch",
            DiagnosticKind::MalformedReference => "malformed-reference",
        };
        f.write_str(name)
    }
}

/// A warning attached to a `CompileResult`. Compilation still succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub node_ids: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, node_ids: Vec<String>) -> Self {
        let diagnostic = Self {
            kind,
            message: message.into(),
            node_ids,
        };
        tracing::warn!(kind = %diagnostic.kind, "{}", diagnostic.message);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
