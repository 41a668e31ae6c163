//! Common imports for consumers of `agentloom-tools`.

pub use crate::{
    RuntimeTool, ToolCallOutcome, ToolCallRequest, ToolContext, ToolError, ToolInvocationOutcome,
    ToolInvoker, ToolResult, ToolSpec, ToolSpecResolver, ToolWrapper,
};
