//! Host-provided dependencies the engine calls out to (spec §6).
//!
//! Tool resolution lives on [`agentloom_tools::ToolSpecResolver`] and
//! approval requests on [`agentloom_approval::ApprovalHost`] — both already
//! have a dedicated trait elsewhere in this workspace, constructed directly
//! by whoever builds an [`crate::engine::Engine`]. This trait covers every
//! other host dependency the spec's "Host-provided dependencies" contract
//! enumerates.

use std::sync::Arc;

use agentloom_codemode::{CodemodeResult, CodemodeSandbox, QuickJsSandbox};
use agentloom_events::Event;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::state::ConversationState;

/// One decoded file a tool or the stream parser wants the host to persist
/// (spec §6 `uploadFile`).
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Raw file bytes (already decoded from base64, if that's how it arrived).
    pub content: Vec<u8>,
    /// A filename hint.
    pub filename: String,
    /// Declared content length, if known ahead of the upload.
    pub content_length: Option<u64>,
    /// MIME type, if known.
    pub mime_type: Option<String>,
    /// Caller-supplied metadata, stored alongside the file.
    pub metadata: Value,
}

/// What the host returns after persisting an uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// The host-side file id, referenced by `FILE_SHARED` events.
    pub file_id: String,
    /// The provider-side file id, if the provider also tracks it.
    pub provider_file_id: Option<String>,
}

/// Context the stream parser attaches to every chunk it forwards verbatim
/// (spec §4.5.1: "with an added `{batchId, activeFunctionCalls}` context").
#[derive(Debug, Clone, Copy)]
pub struct StreamChunkContext {
    /// The `LLM_REQUEST_START` index this chunk belongs to.
    pub batch_id: agentloom_core::EventIndex,
    /// How many tool-call promises are outstanding when this chunk arrived.
    pub active_function_calls: usize,
}

/// What `TOOL_CALL_APPROVED` handling hands the host once the reducer has
/// applied the decision (spec §6 `onToolCallApproved`).
#[derive(Debug, Clone)]
pub struct ToolCallApprovedData {
    /// The approval key that was resolved.
    pub approval_key: String,
    /// Whether it was approved or rejected.
    pub approved: bool,
}

/// The host-provided dependencies the engine cannot discharge itself.
///
/// Every method here is one bullet of spec §6's "Host-provided dependencies"
/// enumeration, minus `toolSpecsToImplementations` (lives on
/// [`agentloom_tools::ToolSpecResolver`]) and `requestApprovalForToolCall`
/// (lives on [`agentloom_approval::ApprovalHost`]), which the engine already
/// takes as their own constructor arguments.
#[async_trait]
pub trait EngineHooks: Send + Sync {
    /// Persist the whole log. Called after every `add_events` batch,
    /// including rollback/error paths; its failure propagates to the
    /// caller rather than being swallowed (spec §7).
    async fn store_events(&self, events: &[Event]) -> Result<(), String>;

    /// Fire-and-forget task runner for LLM request background work. Must
    /// not silently discard the task's eventual panic/error — the default
    /// wiring in [`crate::engine::Engine`] already logs failures internally
    /// before this is ever called, but implementations that route to a
    /// custom executor should preserve that.
    fn background(&self, task: BoxFuture<'static, ()>);

    /// Data context-rule and tool-policy matchers are evaluated against.
    /// Called once per state augmentation (spec §6 `getRuleMatchData`).
    async fn get_rule_match_data(&self, state: &ConversationState) -> Value;

    /// Acquire a fresh codemode evaluator for one read (spec §9
    /// `setupCodemode`'s scoped-acquisition contract). Defaults to a fresh
    /// [`QuickJsSandbox`] per call, matching that type's own "one instance
    /// per invocation" discipline.
    async fn acquire_codemode_sandbox(&self) -> CodemodeResult<Arc<dyn CodemodeSandbox>> {
        Ok(Arc::new(QuickJsSandbox::acquire().await?))
    }

    /// Optional observer, invoked once per admitted event in persist order.
    async fn on_event_added(&self, _event: &Event, _reduced_state: &ConversationState) {}

    /// Persist a decoded file. Required for image-generation output but
    /// otherwise only invoked when a tool actually produces one.
    async fn upload_file(&self, upload: FileUpload) -> Result<UploadedFile, String>;

    /// Turn a host file id into a public URL, if the host exposes one.
    async fn turn_file_id_into_public_url(&self, _file_id: &str) -> Option<String> {
        None
    }

    /// Resolve a durable-object-style redirect URL, if the host supports it.
    async fn get_final_redirect_url(&self, _durable_object_instance_name: &str) -> Option<String> {
        None
    }

    /// Forward a raw provider chunk that carried no engine-relevant
    /// semantics (anything other than output-item-done / response-completed,
    /// spec §4.5.1).
    fn on_llm_stream_response_streaming_chunk(&self, _chunk: &Value, _context: StreamChunkContext) {}

    /// Optional completion hook fired after the approval reducer applies a
    /// `TOOL_CALL_APPROVED` decision. Approving a call is the host's cue to
    /// replay it with an `"injected-…"` call id so the approval wrapper is
    /// skipped (spec §4.8) — that replay is the host's responsibility, not
    /// this hook's.
    async fn on_tool_call_approved(&self, _data: ToolCallApprovedData, _state: &ConversationState) {}
}
