//! Agentloom Runtime - the event-sourced conversation engine.
//!
//! This crate provides:
//! - An append-only event log and a reducer pipeline composing the core
//!   reducer with pluggable slices
//! - Per-read state augmentation (context rules, tool resolution, codemode
//!   substitution)
//! - The LLM request lifecycle: trigger evaluation, stream parsing, and
//!   tool invocation
//!
//! # Example
//!
//! ```rust,no_run
//! use agentloom_runtime::{Engine, EngineConfig, ReducerPipeline};
//! use agentloom_approval::ApprovalSlice;
//! # async fn example(
//! #     llm: std::sync::Arc<dyn agentloom_llm::LlmProvider>,
//! #     hooks: std::sync::Arc<dyn agentloom_runtime::EngineHooks>,
//! #     approval_host: std::sync::Arc<dyn agentloom_approval::ApprovalHost>,
//! #     tool_resolver: std::sync::Arc<dyn agentloom_tools::ToolSpecResolver>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ReducerPipeline::new(vec![Box::new(ApprovalSlice)])?;
//! let engine = std::sync::Arc::new(Engine::new(
//!     llm,
//!     hooks,
//!     approval_host,
//!     tool_resolver,
//!     pipeline,
//!     EngineConfig::default(),
//! ));
//! engine.initialize_with_events(vec![]).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod augmentor;
mod config;
mod engine;
mod hooks;
mod matcher;
mod pipeline;
mod state;
mod stream;

pub use augmentor::StateAugmentor;
pub use config::EngineConfig;
pub use engine::Engine;
pub use hooks::{EngineHooks, FileUpload, StreamChunkContext, ToolCallApprovedData, UploadedFile};
pub use matcher::matches;
pub use pipeline::ReducerPipeline;
pub use state::{AugmentedState, ConversationState, Participant, RecordedToolCall, ScoredInputItem};
pub use stream::{StreamOutcome, StreamParser};
