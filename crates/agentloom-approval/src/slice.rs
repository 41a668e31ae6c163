//! The approval state machine reducer (spec §4.8).

use agentloom_events::{CoreEventData, Event, Slice, StatePatch};
use serde_json::{json, Map, Value};

use crate::types::ApprovalStatus;

/// Tracks `ApprovalEntry` records keyed by `approval_key`, under this
/// slice's own `"approval"` sub-tree.
///
/// The developer-facing messages spec §4.8 describes ("append a developer
/// message to `inputItems` …") mutate *core* state, not this slice's own
/// sub-tree, so they are not produced here — `agentloom-runtime`'s core
/// reducer calls [`pending_call_message`], [`approval_outcome_message`], and
/// [`missing_key_diagnostic`] directly when folding these two event types,
/// alongside delegating to this slice for the state-machine bookkeeping.
pub struct ApprovalSlice;

impl Slice for ApprovalSlice {
    fn name(&self) -> &'static str {
        "approval"
    }

    fn initial_patch(&self) -> StatePatch {
        json!({ "entries": {} })
    }

    fn reduce(&self, state: &Value, _deps: &Value, event: &Event) -> Result<StatePatch, String> {
        match event.as_core_data() {
            Some(CoreEventData::ToolCallApprovalRequested {
                approval_key,
                tool_name,
                args,
                tool_call_id,
            }) => {
                let entry = json!({
                    "approval_key": approval_key,
                    "tool_name": tool_name,
                    "args": args,
                    "tool_call_id": tool_call_id,
                    "status": ApprovalStatus::Pending,
                });
                let mut entries = Map::new();
                entries.insert(approval_key, entry);
                Ok(json!({ "entries": entries }))
            }
            Some(CoreEventData::ToolCallApproved {
                approval_key,
                approved,
            }) => {
                let existing = state
                    .pointer(&format!("/approval/entries/{approval_key}"))
                    .cloned();
                let Some(mut entry) = existing else {
                    return Ok(json!({}));
                };
                let is_pending = entry
                    .get("status")
                    .map(|s| s == &json!(ApprovalStatus::Pending))
                    .unwrap_or(false);
                if !is_pending {
                    return Ok(json!({}));
                }
                let status = if approved {
                    ApprovalStatus::Approved
                } else {
                    ApprovalStatus::Rejected
                };
                entry["status"] = json!(status);
                let mut entries = Map::new();
                entries.insert(approval_key, entry);
                Ok(json!({ "entries": entries }))
            }
            _ => Ok(json!({})),
        }
    }
}

/// The developer message appended to `inputItems` when a call is suspended
/// for approval.
#[must_use]
pub fn pending_call_message(tool_name: &str, approval_key: &str) -> String {
    format!("Tool call \"{tool_name}\" is pending approval (key: {approval_key}).")
}

/// The developer message appended when a pending approval is resolved.
#[must_use]
pub fn approval_outcome_message(approval_key: &str, approved: bool) -> String {
    let verdict = if approved { "approved" } else { "rejected" };
    format!("Approval {approval_key} was {verdict}.")
}

/// The developer diagnostic appended when `TOOL_CALL_APPROVED` references an
/// unknown key.
#[must_use]
pub fn missing_key_diagnostic(approval_key: &str, existing_keys: &[String]) -> String {
    format!(
        "No pending approval found for key {approval_key}. Known keys: [{}]",
        existing_keys.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_core::{EventIndex, Timestamp};
    use agentloom_events::PendingEvent;
    use serde_json::Map as JMap;

    fn event_from(pending: PendingEvent) -> Event {
        Event {
            event_type: pending.event_type,
            data: pending.data,
            metadata: pending.metadata,
            event_index: EventIndex(0),
            created_at: Timestamp::now(),
            trigger_llm_request: pending.trigger_llm_request,
            idempotency_key: pending.idempotency_key,
        }
    }

    #[test]
    fn requested_event_creates_a_pending_entry() {
        let slice = ApprovalSlice;
        let event = event_from(PendingEvent::core(
            CoreEventData::ToolCallApprovalRequested {
                approval_key: "k1".into(),
                tool_name: "delete_file".into(),
                args: json!({"path": "/tmp/x"}),
                tool_call_id: "call-1".into(),
            },
            false,
        ));
        let patch = slice
            .reduce(&json!({"approval": {"entries": {}}}), &json!({}), &event)
            .unwrap();
        assert_eq!(patch["entries"]["k1"]["status"], json!("pending"));
    }

    #[test]
    fn approved_event_on_unknown_key_is_a_no_op() {
        let slice = ApprovalSlice;
        let event = event_from(PendingEvent::core(
            CoreEventData::ToolCallApproved {
                approval_key: "missing".into(),
                approved: true,
            },
            true,
        ));
        let patch = slice
            .reduce(&json!({"approval": {"entries": {}}}), &json!({}), &event)
            .unwrap();
        assert_eq!(patch, json!({}));
    }

    #[test]
    fn approved_event_transitions_a_pending_entry() {
        let slice = ApprovalSlice;
        let mut entries = JMap::new();
        entries.insert(
            "k1".to_string(),
            json!({
                "approval_key": "k1",
                "tool_name": "delete_file",
                "args": {},
                "tool_call_id": "call-1",
                "status": "pending",
            }),
        );
        let state = json!({"approval": {"entries": entries}});
        let event = event_from(PendingEvent::core(
            CoreEventData::ToolCallApproved {
                approval_key: "k1".into(),
                approved: true,
            },
            true,
        ));
        let patch = slice.reduce(&state, &json!({}), &event).unwrap();
        assert_eq!(patch["entries"]["k1"]["status"], json!("approved"));
    }

    #[test]
    fn already_resolved_entry_ignores_a_second_approval_event() {
        let slice = ApprovalSlice;
        let mut entries = JMap::new();
        entries.insert(
            "k1".to_string(),
            json!({
                "approval_key": "k1",
                "tool_name": "delete_file",
                "args": {},
                "tool_call_id": "call-1",
                "status": "approved",
            }),
        );
        let state = json!({"approval": {"entries": entries}});
        let event = event_from(PendingEvent::core(
            CoreEventData::ToolCallApproved {
                approval_key: "k1".into(),
                approved: false,
            },
            true,
        ));
        let patch = slice.reduce(&state, &json!({}), &event).unwrap();
        assert_eq!(patch, json!({}));
    }
}
