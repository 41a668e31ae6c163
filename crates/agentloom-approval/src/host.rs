//! The host-provided approval dependency (spec §6
//! `requestApprovalForToolCall`).

use async_trait::async_trait;
use serde_json::Value;

/// Requests an approval decision from whatever surface the host presents it
/// on (chat UI, CLI prompt, …). Required iff approvals are used at all.
#[async_trait]
pub trait ApprovalHost: Send + Sync {
    /// Ask the host to surface this call for approval and return a fresh
    /// key to track it by. Does not block on the decision — the decision
    /// arrives later as a `TOOL_CALL_APPROVED` event.
    async fn request_approval_for_tool_call(
        &self,
        tool_name: &str,
        args: &Value,
        tool_call_id: &str,
    ) -> String;
}
