//! Approval state types (spec §4.8).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The lifecycle of one suspended tool call: `pending → approved | rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved; the host is expected to replay the call with an
    /// `"injected-…"` id.
    Approved,
    /// Rejected; the call will not be replayed.
    Rejected,
}

/// A tracked approval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalEntry {
    /// The key the request was issued under.
    pub approval_key: String,
    /// The tool that was called.
    pub tool_name: String,
    /// The call's arguments.
    pub args: Value,
    /// The original (suspended) call id.
    pub tool_call_id: String,
    /// Current status.
    pub status: ApprovalStatus,
}

/// `true` if `tool_call_id` is a system-driven replay that must skip the
/// approval wrapper (spec §4.6's `"injected-"` escape hatch).
#[must_use]
pub fn is_injected_replay(tool_call_id: &str) -> bool {
    tool_call_id.starts_with("injected-")
}
