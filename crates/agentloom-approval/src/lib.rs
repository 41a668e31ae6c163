//! Human-in-the-loop tool call approval (component C8, spec §4.8).
//!
//! A tool policy match (evaluated elsewhere, in `agentloom-runtime`'s state
//! augmentor) injects [`ApprovalWrapper`] around a call instead of running
//! it; the wrapper suspends execution and emits a `TOOL_CALL_APPROVAL_REQUESTED`
//! event. [`ApprovalSlice`] tracks each request's `pending → approved |
//! rejected` lifecycle as conversation state.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod gate;
mod host;
pub mod prelude;
mod slice;
mod types;
mod wrapper;

pub use gate::with_approval_gate;
pub use host::ApprovalHost;
pub use slice::{approval_outcome_message, missing_key_diagnostic, pending_call_message, ApprovalSlice};
pub use types::{is_injected_replay, ApprovalEntry, ApprovalStatus};
pub use wrapper::ApprovalWrapper;
