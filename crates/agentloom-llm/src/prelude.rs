//! Common imports for consumers of `agentloom-llm`.
//!
//! ```rust,no_run
//! use agentloom_llm::prelude::*;
//!
//! # async fn example(provider: impl LlmProvider) -> LlmResult<()> {
//! let response = provider.complete_simple("What is 2+2?").await?;
//! println!("Response: {response}");
//! # Ok(())
//! # }
//! ```

pub use crate::{LlmError, LlmResult};
pub use crate::{LlmProvider, ProviderConfig, StreamBox};
pub use crate::{ContentPart, Message, MessageContent, MessageRole};
pub use crate::{LlmResponse, StopReason, StreamEvent, Usage};
pub use crate::{LlmToolDefinition, ToolCall, ToolCallResult};
