//! The closed set of core event kinds (spec §3).
//!
//! Each kind carries a concrete, typed payload rather than an untyped JSON
//! blob — matching the teacher's preference for concrete event types
//! (`astrid_events::AstridEvent`) over stringly-typed payloads. `Event::data`
//! still stores the payload as `serde_json::Value` on the wire (so slice
//! events, which the core crate knows nothing about, fit the same struct),
//! but core event construction and core-reducer dispatch go through this
//! enum so the compiler enforces the payload shape for every core kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A core event's typed payload, tagged by its `type` string.
///
/// The tag strings are exactly the `"CORE:…"` discriminants of spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CoreEventData {
    /// Emitted once after `initialize_with_events` replays a prior log.
    #[serde(rename = "CORE:INITIALIZED_WITH_EVENTS")]
    InitializedWithEvents {
        /// Number of events replayed.
        event_count: usize,
    },

    /// Overwrites the system prompt.
    #[serde(rename = "CORE:SET_SYSTEM_PROMPT")]
    SetSystemPrompt {
        /// The new prompt text.
        prompt: String,
    },

    /// Upserts one or more context rules, keyed by `key`.
    #[serde(rename = "CORE:ADD_CONTEXT_RULES")]
    AddContextRules {
        /// The rules to upsert.
        rules: Vec<ContextRule>,
    },

    /// Atomically overwrites model options.
    #[serde(rename = "CORE:SET_MODEL_OPTS")]
    SetModelOpts {
        /// The new model options.
        model_opts: Value,
    },

    /// Deep-merges into `metadata` (objects merge key-wise, arrays replace).
    #[serde(rename = "CORE:SET_METADATA")]
    SetMetadata {
        /// The metadata patch to merge.
        metadata: Value,
    },

    /// Appends a label to `metadata.labels` if not already present.
    #[serde(rename = "CORE:ADD_LABEL")]
    AddLabel {
        /// The label to add.
        label: String,
    },

    /// Appends an LLM input item (user/developer message, tool output, …).
    #[serde(rename = "CORE:LLM_INPUT_ITEM")]
    LlmInputItem {
        /// The raw item, opaque to the core reducer beyond its id/kind.
        item: Value,
    },

    /// Appends an LLM output item (assistant message, reasoning, …).
    #[serde(rename = "CORE:LLM_OUTPUT_ITEM")]
    LlmOutputItem {
        /// The raw item, opaque to the core reducer beyond its id/kind.
        item: Value,
    },

    /// Marks an LLM request as started.
    #[serde(rename = "CORE:LLM_REQUEST_START")]
    LlmRequestStart {
        /// The responses-API parameter set this request was started with.
        params: Value,
    },

    /// Marks the current LLM request as finished successfully.
    #[serde(rename = "CORE:LLM_REQUEST_END")]
    LlmRequestEnd {
        /// The raw provider response, if any.
        raw_response: Option<Value>,
    },

    /// Marks the current LLM request as cancelled.
    #[serde(rename = "CORE:LLM_REQUEST_CANCEL")]
    LlmRequestCancel {
        /// Why the request was cancelled.
        reason: String,
    },

    /// Records a local tool call and its result.
    #[serde(rename = "CORE:LOCAL_FUNCTION_TOOL_CALL")]
    LocalFunctionToolCall {
        /// The call as seen on the stream.
        call: Value,
        /// The normalized tool result.
        result: Value,
        /// Wall-clock execution time.
        execution_time_ms: u64,
        /// The reasoning item this call is coupled to, if any.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        associated_reasoning_item_id: Option<String>,
        /// The index of the `LLM_REQUEST_START` this call belongs to.
        llm_request_start_event_index: u64,
    },

    /// Records the batch of tool calls a codemode program made.
    #[serde(rename = "CORE:CODEMODE_TOOL_CALLS")]
    CodemodeToolCalls {
        /// One entry per inner tool call the generated program made.
        data: Vec<Value>,
    },

    /// Suspends LLM request triggering.
    #[serde(rename = "CORE:PAUSE_LLM_REQUESTS")]
    PauseLlmRequests {
        /// Why requests were paused.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        reason: Option<String>,
    },

    /// Resumes LLM request triggering.
    #[serde(rename = "CORE:RESUME_LLM_REQUESTS")]
    ResumeLlmRequests {},

    /// A file changed hands between user and agent.
    #[serde(rename = "CORE:FILE_SHARED")]
    FileShared {
        /// Host-side file id.
        file_id: String,
        /// Provider-side file id, if the provider also tracks it.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        provider_file_id: Option<String>,
        /// Direction of the share.
        direction: FileShareDirection,
    },

    /// The agent sent a user-facing message (outside the LLM input/output
    /// item stream — e.g. a proactive notification).
    #[serde(rename = "CORE:MESSAGE_FROM_AGENT")]
    MessageFromAgent {
        /// The message text.
        text: String,
    },

    /// A participant joined the conversation.
    #[serde(rename = "CORE:PARTICIPANT_JOINED")]
    ParticipantJoined {
        /// The participant's user id.
        user_id: String,
        /// Display name, if known.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        display_name: Option<String>,
    },

    /// A participant left the conversation.
    #[serde(rename = "CORE:PARTICIPANT_LEFT")]
    ParticipantLeft {
        /// The participant's user id.
        user_id: String,
    },

    /// A participant was mentioned in a message.
    #[serde(rename = "CORE:PARTICIPANT_MENTIONED")]
    ParticipantMentioned {
        /// The mentioned participant's user id.
        user_id: String,
    },

    /// A tool call was suspended pending approval.
    #[serde(rename = "CORE:TOOL_CALL_APPROVAL_REQUESTED")]
    ToolCallApprovalRequested {
        /// The key the eventual `TOOL_CALL_APPROVED` event must reference.
        approval_key: String,
        /// The tool being called.
        tool_name: String,
        /// The call's arguments.
        args: Value,
        /// The call id the suspended call was made with.
        tool_call_id: String,
    },

    /// A pending approval was resolved.
    #[serde(rename = "CORE:TOOL_CALL_APPROVED")]
    ToolCallApproved {
        /// The approval being resolved.
        approval_key: String,
        /// Whether it was approved or rejected.
        approved: bool,
    },

    /// An internal engine error, always accompanied by a re-raise to the
    /// caller (spec §4.4 step 4, §7).
    #[serde(rename = "CORE:INTERNAL_ERROR")]
    InternalError {
        /// The error message.
        error: String,
        /// A captured stack trace or backtrace, if available.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        stack: Option<String>,
        /// The batch of candidate events that triggered the failure, if any.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        rejected_batch: Option<Value>,
    },

    /// A free-form diagnostic log line.
    #[serde(rename = "CORE:LOG")]
    Log {
        /// The log message.
        msg: String,
    },

    /// Progress reported by a long-running background task (e.g. codemode).
    #[serde(rename = "CORE:BACKGROUND_TASK_PROGRESS")]
    BackgroundTaskProgress {
        /// A human-readable status line.
        status: String,
    },
}

impl CoreEventData {
    /// The `"CORE:…"` discriminant string for this payload's variant.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::InitializedWithEvents { .. } => "CORE:INITIALIZED_WITH_EVENTS",
            Self::SetSystemPrompt { .. } => "CORE:SET_SYSTEM_PROMPT",
            Self::AddContextRules { .. } => "CORE:ADD_CONTEXT_RULES",
            Self::SetModelOpts { .. } => "CORE:SET_MODEL_OPTS",
            Self::SetMetadata { .. } => "CORE:SET_METADATA",
            Self::AddLabel { .. } => "CORE:ADD_LABEL",
            Self::LlmInputItem { .. } => "CORE:LLM_INPUT_ITEM",
            Self::LlmOutputItem { .. } => "CORE:LLM_OUTPUT_ITEM",
            Self::LlmRequestStart { .. } => "CORE:LLM_REQUEST_START",
            Self::LlmRequestEnd { .. } => "CORE:LLM_REQUEST_END",
            Self::LlmRequestCancel { .. } => "CORE:LLM_REQUEST_CANCEL",
            Self::LocalFunctionToolCall { .. } => "CORE:LOCAL_FUNCTION_TOOL_CALL",
            Self::CodemodeToolCalls { .. } => "CORE:CODEMODE_TOOL_CALLS",
            Self::PauseLlmRequests { .. } => "CORE:PAUSE_LLM_REQUESTS",
            Self::ResumeLlmRequests {} => "CORE:RESUME_LLM_REQUESTS",
            Self::FileShared { .. } => "CORE:FILE_SHARED",
            Self::MessageFromAgent { .. } => "CORE:MESSAGE_FROM_AGENT",
            Self::ParticipantJoined { .. } => "CORE:PARTICIPANT_JOINED",
            Self::ParticipantLeft { .. } => "CORE:PARTICIPANT_LEFT",
            Self::ParticipantMentioned { .. } => "CORE:PARTICIPANT_MENTIONED",
            Self::ToolCallApprovalRequested { .. } => "CORE:TOOL_CALL_APPROVAL_REQUESTED",
            Self::ToolCallApproved { .. } => "CORE:TOOL_CALL_APPROVED",
            Self::InternalError { .. } => "CORE:INTERNAL_ERROR",
            Self::Log { .. } => "CORE:LOG",
            Self::BackgroundTaskProgress { .. } => "CORE:BACKGROUND_TASK_PROGRESS",
        }
    }
}

/// Direction a shared file travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileShareDirection {
    /// User to agent.
    FromUserToAgent,
    /// Agent to user.
    FromAgentToUser,
}

/// A context rule record (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRule {
    /// The rule's key — upserts are keyed by this.
    pub key: String,
    /// An optional matcher, evaluated against host-provided rule-match data.
    /// Absent matcher means the rule is always enabled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub matcher: Option<String>,
    /// A prompt fragment contributed when this rule is enabled.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prompt: Option<String>,
    /// Tool specs this rule contributes when enabled.
    #[serde(default)]
    pub tools: Vec<Value>,
    /// Tool policies (approval / codemode matchers) this rule contributes.
    #[serde(default)]
    pub tool_policies: Vec<Value>,
    /// MCP-style server declarations this rule contributes.
    #[serde(default)]
    pub mcp_servers: Vec<Value>,
}

/// All `"CORE:…"` discriminant strings, for ingress schema validation.
pub const CORE_EVENT_TYPES: &[&str] = &[
    "CORE:INITIALIZED_WITH_EVENTS",
    "CORE:SET_SYSTEM_PROMPT",
    "CORE:ADD_CONTEXT_RULES",
    "CORE:SET_MODEL_OPTS",
    "CORE:SET_METADATA",
    "CORE:ADD_LABEL",
    "CORE:LLM_INPUT_ITEM",
    "CORE:LLM_OUTPUT_ITEM",
    "CORE:LLM_REQUEST_START",
    "CORE:LLM_REQUEST_END",
    "CORE:LLM_REQUEST_CANCEL",
    "CORE:LOCAL_FUNCTION_TOOL_CALL",
    "CORE:CODEMODE_TOOL_CALLS",
    "CORE:PAUSE_LLM_REQUESTS",
    "CORE:RESUME_LLM_REQUESTS",
    "CORE:FILE_SHARED",
    "CORE:MESSAGE_FROM_AGENT",
    "CORE:PARTICIPANT_JOINED",
    "CORE:PARTICIPANT_LEFT",
    "CORE:PARTICIPANT_MENTIONED",
    "CORE:TOOL_CALL_APPROVAL_REQUESTED",
    "CORE:TOOL_CALL_APPROVED",
    "CORE:INTERNAL_ERROR",
    "CORE:LOG",
    "CORE:BACKGROUND_TASK_PROGRESS",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_matches_serde_rename() {
        let data = CoreEventData::SetSystemPrompt {
            prompt: "hi".into(),
        };
        let value = serde_json::to_value(&data).expect("serialize");
        assert_eq!(value["type"], "CORE:SET_SYSTEM_PROMPT");
        assert_eq!(data.type_tag(), "CORE:SET_SYSTEM_PROMPT");
    }

    #[test]
    fn every_variant_tag_is_in_the_closed_set() {
        let samples = [
            CoreEventData::ResumeLlmRequests {},
            CoreEventData::Log { msg: "x".into() },
        ];
        for sample in samples {
            assert!(CORE_EVENT_TYPES.contains(&sample.type_tag()));
        }
    }
}
