//! The LLM provider contract the engine depends on (spec §4.5, §6).
//!
//! This crate defines only the boundary: message/tool types, the streaming
//! event vocabulary, and the [`LlmProvider`] trait. Concrete provider SDKs
//! (wire formats, HTTP transport, model-specific quirks) are a host
//! responsibility and are not implemented here.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
pub mod prelude;
mod provider;
mod types;

pub use error::{LlmError, LlmResult};
pub use provider::{LlmProvider, ProviderConfig, StreamBox};
pub use types::{
    ContentPart, LlmResponse, LlmToolDefinition, Message, MessageContent, MessageRole,
    StopReason, StreamEvent, ToolCall, ToolCallResult, Usage,
};
