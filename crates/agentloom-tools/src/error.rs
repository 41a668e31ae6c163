//! Tool execution errors.

use thiserror::Error;

/// Errors a [`crate::RuntimeTool::execute`] or [`crate::ToolWrapper::wrap`]
/// may return before invoker-level normalization (spec §4.6).
#[derive(Debug, Error)]
pub enum ToolError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Arguments failed schema validation. Normalized without a stack trace.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution failed for a reason the tool itself detected.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// A referenced path (file, tool name, server) was not found.
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// The tool did not complete within its allotted time.
    #[error("Timeout after {0}ms")]
    Timeout(u64),

    /// Any other failure.
    #[error("{0}")]
    Other(String),
}

impl ToolError {
    /// `true` for errors that should be normalized without a stack trace
    /// (spec §4.6: "schema-validation messages omit stack").
    #[must_use]
    pub fn omits_stack(&self) -> bool {
        matches!(self, Self::InvalidArguments(_))
    }
}

/// Result type for tool execution.
pub type ToolResult = Result<serde_json::Value, ToolError>;
