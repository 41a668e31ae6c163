//! Unified prelude for the agentloom conversation engine.
//!
//! This crate provides a single import to bring in all commonly used types
//! from across agentloom. Use this when you need types from multiple
//! crates without managing individual imports.
//!
//! # Usage
//!
//! ```rust,ignore
//! use agentloom_prelude::*;
//!
//! // Now you have access to types from:
//! // - agentloom-core (ids, EngineError)
//! // - agentloom-events (Event, CoreEventData, EventLog, Slice)
//! // - agentloom-llm (LlmProvider, Message, StreamEvent)
//! // - agentloom-tools (RuntimeTool, ToolInvoker)
//! // - agentloom-approval (ApprovalHost, ApprovalSlice)
//! // - agentloom-codemode (CodemodeSubstitution)
//! // - agentloom-runtime (Engine, EngineConfig, ReducerPipeline)
//! // - agentloom-config (Config)
//! // - agentloom-telemetry (LogConfig, setup_logging)
//! ```
//!
//! # Per-Crate Preludes
//!
//! If you only need types from specific crates, use their individual preludes:
//!
//! ```rust,ignore
//! use agentloom_core::prelude::*;
//! use agentloom_events::prelude::*;
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use agentloom_prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     llm: Arc<dyn agentloom_llm::LlmProvider>,
//! #     hooks: Arc<dyn EngineHooks>,
//! #     approval_host: Arc<dyn agentloom_approval::ApprovalHost>,
//! #     tool_resolver: Arc<dyn agentloom_tools::ToolSpecResolver>,
//! # ) -> EngineResult<()> {
//! let pipeline = ReducerPipeline::new(vec![Box::new(ApprovalSlice)])?;
//! let engine = Arc::new(Engine::new(
//!     llm, hooks, approval_host, tool_resolver, pipeline, EngineConfig::default(),
//! ));
//! engine.initialize_with_events(vec![]).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

// Re-export all crate preludes
pub use agentloom_approval::prelude::*;
pub use agentloom_codemode::prelude::*;
pub use agentloom_config::prelude::*;
pub use agentloom_core::prelude::*;
pub use agentloom_events::prelude::*;
pub use agentloom_llm::prelude::*;
pub use agentloom_runtime::prelude::*;
pub use agentloom_telemetry::prelude::*;
pub use agentloom_tools::prelude::*;
