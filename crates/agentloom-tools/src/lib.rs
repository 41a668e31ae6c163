//! Tool resolution and invocation (component C6, spec §4.6).
//!
//! Concrete tool implementations (filesystem, shell, search, …) are a host
//! responsibility and are not defined here; this crate is the pluggable
//! resolution and execution contract tools plug into: [`ToolSpecResolver`]
//! turns declared specs into [`RuntimeTool`]s, and [`ToolInvoker`] resolves,
//! wraps, executes, and normalizes a single call.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod invoker;
pub mod prelude;
mod tool;

pub use error::{ToolError, ToolResult};
pub use invoker::ToolInvoker;
pub use tool::{
    BoxFuture, Next, RuntimeTool, ToolCallOutcome, ToolCallRequest, ToolContext,
    ToolInvocationOutcome, ToolSpec, ToolSpecResolver, ToolWrapper,
};
