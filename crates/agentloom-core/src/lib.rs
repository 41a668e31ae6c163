//! agentloom-core — foundation types shared across the conversation engine.
//!
//! This crate provides:
//! - `ConversationId`, `EventIndex`, `Timestamp` — the identifiers the event
//!   log and reducer pipeline are built around
//! - `EngineError` — the structural-error taxonomy (precondition violations,
//!   schema failures, host contract breaches) that the engine re-raises to
//!   its caller rather than folding into an event
//! - small string/text helpers shared by the tool invoker and event reducer

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod ids;
pub mod prelude;
pub mod text;

pub use error::{EngineError, EngineResult};
pub use ids::{ConversationId, EventIndex, Timestamp};
pub use text::truncate_to_boundary;
