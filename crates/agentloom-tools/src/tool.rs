//! The resolution contract: tool specs, runtime tools, and wrappers.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentloom_events::PendingEvent;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolResult;

/// A pending function call awaiting invocation.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    /// The call id as seen on the LLM stream (or a synthetic
    /// `"injected-…"`/`"<outer>-…"` id for replays and codemode sub-calls).
    pub tool_call_id: String,
    /// The tool name being called.
    pub tool_name: String,
    /// Raw `arguments` JSON as received from the provider (may be an empty
    /// string, which the invoker treats as `{}`).
    pub raw_arguments: String,
}

/// Context shared across a single read's tool invocations.
///
/// Deliberately thin: concrete tool implementations (filesystem, shell, …)
/// are a host responsibility, so this crate only carries what the
/// invocation machinery itself needs.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Host-supplied opaque context, forwarded to every tool and wrapper
    /// unexamined (e.g. workspace id, participant id).
    pub host_context: Value,
}

/// The declared shape of a tool, as it appears in augmented state's
/// `toolSpecs`, prior to resolution into a [`RuntimeTool`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    /// Tool name.
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: String,
    /// JSON schema for the tool's input.
    pub input_schema: Value,
    /// Whether this spec describes an invocable function (vs. e.g. a
    /// provider built-in the engine never dispatches itself).
    pub is_function: bool,
}

/// Resolves tool specs contributed by enabled context rules into concrete,
/// invocable tools. A host-provided implementation (spec §6
/// `toolSpecsToImplementations`).
pub trait ToolSpecResolver: Send + Sync {
    /// Resolve a batch of specs into runtime tools. Specs this resolver does
    /// not recognize are simply omitted from the result.
    fn resolve(&self, specs: &[ToolSpec]) -> Vec<Arc<dyn RuntimeTool>>;
}

/// A tool as actually invocable this read: name, schema, wrapper chain, and
/// an executor.
#[async_trait]
pub trait RuntimeTool: Send + Sync {
    /// Tool name, matched against `call.tool_name`.
    fn name(&self) -> &str;

    /// Human-readable description for the LLM.
    fn description(&self) -> &str;

    /// JSON schema for the tool's input.
    fn input_schema(&self) -> Value;

    /// Wrappers to compose around `execute`, outermost first. An approval
    /// wrapper (when injected, spec §4.6) is prepended by the state
    /// augmentor, not listed here.
    fn wrappers(&self) -> &[Arc<dyn ToolWrapper>] {
        &[]
    }

    /// Run the tool's own logic, after all wrappers. `args` is already
    /// parsed JSON (empty arguments parse to `{}`).
    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult;
}

/// The result of a fully wrapped tool invocation, in the shape the reducer
/// pipeline applies back to state (spec §4.6, §4.7 step 3e).
#[derive(Debug, Clone)]
pub struct ToolInvocationOutcome {
    /// The call's outcome as reported to the LLM.
    pub tool_call_result: ToolCallOutcome,
    /// Override for whether this invocation should trigger a new LLM
    /// request. `None` defers to the engine's default (`true`).
    pub trigger_llm_request: Option<bool>,
    /// Additional events to append alongside the call's own recorded event.
    pub add_events: Vec<PendingEvent>,
}

impl ToolInvocationOutcome {
    /// A plain successful result with no side events.
    #[must_use]
    pub fn success(output: Value) -> Self {
        Self {
            tool_call_result: ToolCallOutcome::Success { output },
            trigger_llm_request: None,
            add_events: Vec::new(),
        }
    }

    /// A plain failed result with no side events.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            tool_call_result: ToolCallOutcome::Error {
                error: error.into(),
            },
            trigger_llm_request: None,
            add_events: Vec::new(),
        }
    }
}

/// What the LLM is told about a completed tool call.
#[derive(Debug, Clone)]
pub enum ToolCallOutcome {
    /// The call succeeded.
    Success {
        /// The (non-serializable values stripped) output.
        output: Value,
    },
    /// The call failed. `error` is the normalized message (spec §4.6).
    Error {
        /// The normalized error message.
        error: String,
    },
}

/// A boxed, `'static` future — the shape every point in the wrapper chain
/// passes along.
pub type BoxFuture = Pin<Box<dyn Future<Output = ToolInvocationOutcome> + Send>>;

/// The remainder of the wrapper chain, as seen by one wrapper's `wrap`.
/// Calling it runs every wrapper and the executor inside it.
pub type Next = Arc<dyn Fn(Value) -> BoxFuture + Send + Sync>;

/// One link in a tool's execution chain (spec §4.6 "wrapping").
///
/// Composed innermost-last around `execute`: the *last* entry in
/// [`RuntimeTool::wrappers`] sits closest to `execute`, the first is
/// outermost and sees the call before anything else does. The approval
/// wrapper (see `agentloom-approval`) is the canonical example — it is
/// injected as the outermost wrapper and, when triggered, never calls
/// `next` at all.
#[async_trait]
pub trait ToolWrapper: Send + Sync {
    /// Handle one call. Call `next(args)` to continue the chain, or return
    /// without calling it to short-circuit (e.g. to suspend for approval).
    async fn wrap(
        &self,
        call: &ToolCallRequest,
        args: Value,
        ctx: &ToolContext,
        next: Next,
    ) -> ToolInvocationOutcome;
}
