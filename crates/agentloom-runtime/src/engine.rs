//! The conversation engine (components C1-C5 wired together, spec §6).
//!
//! Grounded on `astrid-runtime/src/runtime/mod.rs`'s `AgentRuntime<P>`: one
//! struct parameterized over the LLM provider, owning the mutable
//! conversation state behind a single async mutex and exposing the engine's
//! public surface as methods on it. Unlike `AgentRuntime`, which stashes a
//! `Weak<Self>` at construction so background tasks can re-acquire an `Arc`,
//! every mutating method here takes `self: &Arc<Self>` directly — the
//! caller is expected to hold the engine behind an `Arc` from the start, so
//! there is nothing to work around.
//!
//! The mutex wraps both the event log and the reduced state together
//! ([`EngineInner`]), rather than spec's literal `Mutex<()>` guarding fields
//! stored beside it: Rust's ownership model has no safe way to let a bare
//! `Mutex<()>` serialize access to data it does not itself own.

use std::sync::Arc;

use agentloom_approval::ApprovalHost;
use agentloom_core::{EngineError, EngineResult, EventIndex};
use agentloom_events::{CoreEventData, Event, EventLog, PendingEvent};
use agentloom_llm::{LlmProvider, LlmToolDefinition, Message, ToolCall, ToolCallResult};
use agentloom_tools::{ToolCallRequest, ToolContext, ToolInvocationOutcome, ToolInvoker, ToolSpecResolver};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::augmentor::StateAugmentor;
use crate::config::EngineConfig;
use crate::hooks::EngineHooks;
use crate::pipeline::ReducerPipeline;
use crate::state::{AugmentedState, ConversationState};
use crate::stream::StreamParser;

struct EngineInner {
    events: EventLog,
    state: ConversationState,
    initialized: bool,
}

/// The conversation engine: owns one conversation's event log and reduced
/// state, and drives the `addEvents` / LLM-request lifecycle over it.
pub struct Engine<P: LlmProvider> {
    llm: Arc<P>,
    hooks: Arc<dyn EngineHooks>,
    augmentor: StateAugmentor,
    pipeline: ReducerPipeline,
    config: EngineConfig,
    inner: Mutex<EngineInner>,
}

impl<P: LlmProvider + 'static> Engine<P> {
    /// Build a fresh, uninitialized engine. `pipeline` must already include
    /// every registered [`agentloom_events::Slice`] (e.g.
    /// [`agentloom_approval::ApprovalSlice`]); this type does not add any of
    /// its own.
    #[must_use]
    pub fn new(
        llm: Arc<P>,
        hooks: Arc<dyn EngineHooks>,
        approval_host: Arc<dyn ApprovalHost>,
        tool_resolver: Arc<dyn ToolSpecResolver>,
        pipeline: ReducerPipeline,
        config: EngineConfig,
    ) -> Self {
        let mut events = EventLog::new();
        events.register_slice_event_types(pipeline.slice_names().into_iter().map(String::from));
        let state = ConversationState::empty(&pipeline.initial_slice_patches());
        let augmentor = StateAugmentor::new(tool_resolver, approval_host);

        Self {
            llm,
            hooks,
            augmentor,
            pipeline,
            config,
            inner: Mutex::new(EngineInner { events, state, initialized: false }),
        }
    }

    /// Replay a previously persisted log, preserving original indices and
    /// timestamps, then relaunch an in-flight LLM request if the host
    /// crashed mid-run (spec §4.5 "Initialization-time recovery"). Once per
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AlreadyInitialized`] if called twice, or a
    /// folding error from a malformed persisted event.
    pub async fn initialize_with_events(self: &Arc<Self>, events: Vec<Event>) -> EngineResult<()> {
        let relaunch_index = {
            let mut guard = self.inner.lock().await;
            if guard.initialized {
                return Err(EngineError::AlreadyInitialized);
            }

            let mut log = EventLog::from_persisted(events.clone());
            log.register_slice_event_types(self.pipeline.slice_names().into_iter().map(String::from));

            let mut state = ConversationState::empty(&self.pipeline.initial_slice_patches());
            for event in &events {
                state = self.pipeline.fold_one(&state, event)?;
            }
            let relaunch_index = state.llm_request_started_at_index;

            let marker = PendingEvent::core(
                CoreEventData::InitializedWithEvents { event_count: events.len() },
                false,
            );
            if let Some(stamped) = log.append_one(marker)? {
                let stamped = stamped.clone();
                state = self.pipeline.fold_one(&state, &stamped)?;
                self.hooks.on_event_added(&stamped, &state).await;
            }

            guard.events = log;
            guard.state = state;
            guard.initialized = true;

            self.hooks
                .store_events(guard.events.snapshot())
                .await
                .map_err(EngineError::HostCallbackFailed)?;

            relaunch_index
        };

        if let Some(index) = relaunch_index {
            let engine = self.clone();
            self.hooks.background(Box::pin(async move { engine.run_llm_request(index).await }));
        }

        Ok(())
    }

    /// Submit one candidate event; see [`Self::add_events`].
    ///
    /// # Errors
    ///
    /// See [`Self::add_events`].
    pub async fn add_event(self: &Arc<Self>, candidate: PendingEvent) -> EngineResult<Vec<Event>> {
        self.add_events(vec![candidate]).await
    }

    /// Admit a batch of candidate events under the engine's serializing
    /// mutex (spec §4.4).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotInitialized`] if called before
    /// [`Self::initialize_with_events`]. On a validation or reducer
    /// failure, the batch (and any partial state change from it) is rolled
    /// back, a synthetic `INTERNAL_ERROR` event is recorded, and the
    /// original error is returned. A `storeEvents` host failure propagates
    /// as [`EngineError::HostCallbackFailed`] either way.
    pub async fn add_events(self: &Arc<Self>, candidates: Vec<PendingEvent>) -> EngineResult<Vec<Event>> {
        let mut guard = self.inner.lock().await;
        if !guard.initialized {
            return Err(EngineError::NotInitialized);
        }

        let state_checkpoint = guard.state.clone();
        let log_checkpoint = guard.events.snapshot().len();
        let rejected_batch = serde_json::to_value(&candidates).ok();

        match self.apply_batch(&mut guard, candidates).await {
            Ok(admitted) => {
                self.evaluate_trigger(&mut guard).await;
                self.hooks
                    .store_events(guard.events.snapshot())
                    .await
                    .map_err(EngineError::HostCallbackFailed)?;
                Ok(admitted)
            }
            Err(err) => {
                guard.state = state_checkpoint;
                guard.events.rollback_to(log_checkpoint);

                let error_event = PendingEvent::core(
                    CoreEventData::InternalError {
                        error: err.to_string(),
                        stack: None,
                        rejected_batch,
                    },
                    false,
                );
                if let Ok(Some(stamped)) = guard.events.append_one(error_event) {
                    let stamped = stamped.clone();
                    if let Ok(next_state) = self.pipeline.fold_one(&guard.state, &stamped) {
                        guard.state = next_state;
                    }
                    self.hooks.on_event_added(&stamped, &guard.state).await;
                }

                if self.hooks.store_events(guard.events.snapshot()).await.is_err() {
                    tracing::error!("failed to persist log after rollback");
                }
                Err(err)
            }
        }
    }

    async fn apply_batch(&self, guard: &mut EngineInner, candidates: Vec<PendingEvent>) -> EngineResult<Vec<Event>> {
        let mut admitted = Vec::with_capacity(candidates.len());
        for pending in candidates {
            let Some(stamped) = guard.events.append_one(pending)? else {
                continue;
            };
            let stamped = stamped.clone();
            guard.state = self.pipeline.fold_one(&guard.state, &stamped)?;
            self.hooks.on_event_added(&stamped, &guard.state).await;
            admitted.push(stamped);
        }
        Ok(admitted)
    }

    /// Spec §4.4 step 6: decide whether to (re)start an LLM run.
    async fn evaluate_trigger(self: &Arc<Self>, guard: &mut EngineInner) {
        if !guard.state.trigger_llm_request {
            return;
        }
        if guard.state.paused {
            tracing::debug!("trigger suppressed: conversation is paused");
            return;
        }

        let boundary = guard.state.last_user_action_index();
        let repeats = guard.state.function_calls_named_since(&self.config.loop_failsafe_tool_name, boundary);
        if repeats >= self.config.loop_failsafe_threshold {
            let pause = PendingEvent::core(
                CoreEventData::PauseLlmRequests {
                    reason: Some(format!(
                        "paused after {repeats} repeated calls to {} with no intervening user action",
                        self.config.loop_failsafe_tool_name
                    )),
                },
                false,
            );
            if let Ok(Some(stamped)) = guard.events.append_one(pause) {
                let stamped = stamped.clone();
                if let Ok(next_state) = self.pipeline.fold_one(&guard.state, &stamped) {
                    guard.state = next_state;
                }
                self.hooks.on_event_added(&stamped, &guard.state).await;
            }
            return;
        }

        if let Some(old_index) = guard.state.llm_request_started_at_index {
            let new_index = guard.events.next_index();
            let cancel = PendingEvent::core(
                CoreEventData::LlmRequestCancel { reason: format!("#{old_index} superseded by #{new_index}") },
                false,
            );
            if let Ok(Some(stamped)) = guard.events.append_one(cancel) {
                let stamped = stamped.clone();
                if let Ok(next_state) = self.pipeline.fold_one(&guard.state, &stamped) {
                    guard.state = next_state;
                }
                self.hooks.on_event_added(&stamped, &guard.state).await;
            }
        }

        let augmented = match self.augmented_state(&guard.state).await {
            Ok(augmented) => augmented,
            Err(err) => {
                tracing::error!(error = %err, "failed to augment state while starting an llm run");
                return;
            }
        };
        let params = compute_responses_params(&guard.state, &augmented);

        let start = PendingEvent::core(CoreEventData::LlmRequestStart { params }, false);
        let Ok(Some(stamped)) = guard.events.append_one(start) else {
            return;
        };
        let stamped = stamped.clone();
        let Ok(next_state) = self.pipeline.fold_one(&guard.state, &stamped) else {
            return;
        };
        guard.state = next_state;
        self.hooks.on_event_added(&stamped, &guard.state).await;

        let this_index = stamped.event_index;
        let engine = self.clone();
        self.hooks.background(Box::pin(async move { engine.run_llm_request(this_index).await }));
    }

    /// Run one LLM request in the background, tagged with `this_index`
    /// (spec §4.5 "Run discipline"). Errors are logged, not propagated:
    /// this is always invoked fire-and-forget via [`EngineHooks::background`].
    pub async fn run_llm_request(self: &Arc<Self>, this_index: EventIndex) {
        if let Err(err) = self.run_llm_request_fallible(this_index).await {
            tracing::error!(index = %this_index, error = %err, "llm request run failed");
        }
    }

    async fn run_llm_request_fallible(self: &Arc<Self>, this_index: EventIndex) -> EngineResult<()> {
        let (params, tool_invoker) = {
            let guard = self.inner.lock().await;
            if guard.state.llm_request_started_at_index != Some(this_index) {
                return Ok(());
            }
            let event = guard.events.snapshot().get(this_index.0 as usize).ok_or_else(|| {
                EngineError::Validation(format!("no event at index {this_index} for the started run"))
            })?;
            let params = match event.as_core_data() {
                Some(CoreEventData::LlmRequestStart { params }) => params,
                _ => return Err(EngineError::Validation(format!("event at {this_index} is not LLM_REQUEST_START"))),
            };
            let augmented = self.augmented_state(&guard.state).await?;
            (params, Arc::new(ToolInvoker::new(augmented.runtime_tools)))
        };

        let system = params.get("instructions").and_then(Value::as_str).unwrap_or_default().to_string();
        let input_items = params.get("input").and_then(Value::as_array).cloned().unwrap_or_default();
        let messages = input_items_to_messages(&input_items);
        let tool_defs = params_to_tool_definitions(&params);

        let stream = match self.llm.stream(&messages, &tool_defs, &system).await {
            Ok(stream) => stream,
            Err(err) => return self.cancel_with_error(this_index, err.to_string()).await,
        };

        {
            let guard = self.inner.lock().await;
            if guard.state.llm_request_started_at_index != Some(this_index) {
                return Ok(());
            }
        }

        let parser = StreamParser::new(tool_invoker, ToolContext::default(), self.hooks.clone(), this_index);
        let outcome = match parser.consume(stream).await {
            Ok(outcome) => outcome,
            Err(err) => return self.cancel_with_error(this_index, err.to_string()).await,
        };

        {
            let guard = self.inner.lock().await;
            if guard.state.llm_request_started_at_index != Some(this_index) {
                return Ok(());
            }
        }

        let mut events = outcome.events;
        events.push(PendingEvent::core(CoreEventData::LlmRequestEnd { raw_response: None }, false));
        self.add_events(events).await?;
        Ok(())
    }

    async fn cancel_with_error(self: &Arc<Self>, this_index: EventIndex, message: String) -> EngineResult<()> {
        {
            let guard = self.inner.lock().await;
            if guard.state.llm_request_started_at_index != Some(this_index) {
                return Ok(());
            }
        }
        self.add_events(vec![
            PendingEvent::core(
                CoreEventData::InternalError { error: message, stack: None, rejected_batch: None },
                false,
            ),
            PendingEvent::core(CoreEventData::LlmRequestCancel { reason: "error".to_string() }, false),
        ])
        .await?;
        Ok(())
    }

    async fn augmented_state(&self, state: &ConversationState) -> EngineResult<AugmentedState> {
        let match_data = self.hooks.get_rule_match_data(state).await;
        let sandbox = self
            .hooks
            .acquire_codemode_sandbox()
            .await
            .map_err(|err: agentloom_codemode::CodemodeError| EngineError::HostCallbackFailed(err.to_string()))?;
        Ok(self.augmentor.augment(state, &match_data, sandbox))
    }

    /// The augmented state snapshot for the current reduced state (spec §6
    /// `state`).
    ///
    /// # Errors
    ///
    /// Propagates a failure acquiring a codemode sandbox.
    pub async fn state(&self) -> EngineResult<AugmentedState> {
        let guard = self.inner.lock().await;
        self.augmented_state(&guard.state).await
    }

    /// The full event log, read-only (spec §6 `events`).
    pub async fn events(&self) -> Vec<Event> {
        self.inner.lock().await.events.snapshot().to_vec()
    }

    /// Whether an LLM request is currently in progress (spec §6
    /// `llmRequestInProgress`).
    pub async fn llm_request_in_progress(&self) -> bool {
        self.inner.lock().await.state.llm_request_started_at_index.is_some()
    }

    /// Replay events `0..index` and return the resulting augmented state,
    /// for debugging (spec §6 `getReducedStateAtEventIndex`).
    ///
    /// # Errors
    ///
    /// Propagates a reducer failure on any of the replayed events, or a
    /// codemode sandbox acquisition failure.
    pub async fn get_reduced_state_at_event_index(&self, index: EventIndex) -> EngineResult<AugmentedState> {
        let guard = self.inner.lock().await;
        let mut state = ConversationState::empty(&self.pipeline.initial_slice_patches());
        for event in guard.events.replay_up_to(index) {
            state = self.pipeline.fold_one(&state, event)?;
        }
        self.augmented_state(&state).await
    }

    /// Directly invoke a resolved tool by name against the current
    /// augmented state (spec §6 `tryInvokeLocalFunctionTool`; used by
    /// codemode's own function table, and exposed here for hosts that want
    /// the same entry point).
    pub async fn try_invoke_local_function_tool(&self, call: &ToolCallRequest) -> ToolInvocationOutcome {
        let guard = self.inner.lock().await;
        let augmented = match self.augmented_state(&guard.state).await {
            Ok(augmented) => augmented,
            Err(err) => {
                return ToolInvocationOutcome::failure(format!("failed to resolve tools: {err}"));
            }
        };
        drop(guard);
        let invoker = ToolInvoker::new(augmented.runtime_tools);
        invoker.invoke(call, &ToolContext::default()).await
    }
}

/// Builds the responses-API parameter set from reduced and augmented state
/// (spec §6 "Responses-API parameter set").
fn compute_responses_params(state: &ConversationState, augmented: &AugmentedState) -> Value {
    let mut model_opts = state.model_opts.clone();
    if let Value::Object(ref mut map) = model_opts {
        if let Some(tool_choice) = map.remove("toolChoice") {
            map.insert("tool_choice".to_string(), tool_choice);
        }
    }

    let mut instructions = state.system_prompt.clone();
    let mut keys: Vec<&String> = augmented.ephemeral_prompt_fragments.keys().collect();
    keys.sort();
    for key in keys {
        let fragment = &augmented.ephemeral_prompt_fragments[key];
        instructions.push_str(&format!("\n<context key=\"{key}\">\n{fragment}\n</context>"));
    }

    let input: Vec<Value> = state.sorted_input_items().into_iter().cloned().collect();

    let tools: Vec<Value> = augmented
        .runtime_tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name(),
                "description": tool.description(),
                "input_schema": tool.input_schema(),
            })
        })
        .collect();

    json!({
        "model_opts": model_opts,
        "instructions": instructions,
        "input": input,
        "parallel_tool_calls": true,
        "tools": tools,
    })
}

fn params_to_tool_definitions(params: &Value) -> Vec<LlmToolDefinition> {
    params
        .get("tools")
        .and_then(Value::as_array)
        .map(|tools| {
            tools
                .iter()
                .map(|tool| {
                    let name = tool.get("name").and_then(Value::as_str).unwrap_or_default();
                    let mut def = LlmToolDefinition::new(name);
                    if let Some(description) = tool.get("description").and_then(Value::as_str) {
                        def = def.with_description(description);
                    }
                    if let Some(schema) = tool.get("input_schema") {
                        def = def.with_schema(schema.clone());
                    }
                    def
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Bridges the spec's flat Responses-API `input` item list onto
/// [`agentloom_llm::LlmProvider`]'s chat-style `&[Message]` call shape. This
/// crate's provider trait predates the raw-item shape the engine's
/// `compute_responses_params` produces; the full parameter set is still what
/// gets recorded on `LLM_REQUEST_START` for audit/replay, this conversion
/// only governs what is actually sent to `P::stream`.
fn input_items_to_messages(items: &[Value]) -> Vec<Message> {
    let mut messages = Vec::new();
    let mut pending_calls: Vec<ToolCall> = Vec::new();

    for item in items {
        if let Some(role) = item.get("role").and_then(Value::as_str) {
            flush_pending_calls(&mut messages, &mut pending_calls);
            let text = first_text(item);
            match role {
                "assistant" => messages.push(Message::assistant(text)),
                "developer" | "system" => messages.push(Message::system(text)),
                _ => messages.push(Message::user(text)),
            }
            continue;
        }

        match item.get("type").and_then(Value::as_str) {
            Some("function_call") => {
                let id = item.get("call_id").and_then(Value::as_str).unwrap_or_default();
                let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
                let arguments = item.get("arguments").cloned().unwrap_or(Value::Object(serde_json::Map::new()));
                pending_calls.push(ToolCall::new(id, name).with_arguments(arguments));
            }
            Some("function_call_output") => {
                flush_pending_calls(&mut messages, &mut pending_calls);
                let call_id = item.get("call_id").and_then(Value::as_str).unwrap_or_default();
                let output = item.get("output").and_then(Value::as_str).unwrap_or_default();
                messages.push(Message::tool_result(ToolCallResult::success(call_id, output)));
            }
            _ => {}
        }
    }
    flush_pending_calls(&mut messages, &mut pending_calls);
    messages
}

fn flush_pending_calls(messages: &mut Vec<Message>, pending: &mut Vec<ToolCall>) {
    if !pending.is_empty() {
        messages.push(Message::assistant_with_tools(std::mem::take(pending)));
    }
}

fn first_text(item: &Value) -> String {
    item.get("content")
        .and_then(Value::as_array)
        .and_then(|parts| {
            parts.iter().find_map(|part| {
                part.get("type")
                    .and_then(Value::as_str)
                    .filter(|t| *t == "input_text" || *t == "output_text")
                    .and_then(|_| part.get("text").and_then(Value::as_str))
            })
        })
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_llm::{LlmResult, MessageContent, StreamBox};
    use agentloom_tools::{RuntimeTool, ToolResult};
    use async_trait::async_trait;
    use futures::stream;

    struct StubProvider;

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }
        fn model(&self) -> &str {
            "stub-model"
        }
        async fn stream(&self, _messages: &[Message], _tools: &[LlmToolDefinition], _system: &str) -> LlmResult<StreamBox> {
            Ok(Box::pin(stream::iter(vec![
                Ok(agentloom_llm::StreamEvent::TextDelta("hi".into())),
                Ok(agentloom_llm::StreamEvent::Done),
            ])))
        }
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            _system: &str,
        ) -> LlmResult<agentloom_llm::LlmResponse> {
            unimplemented!("not exercised by these tests")
        }
        fn max_context_length(&self) -> usize {
            8192
        }
    }

    struct NoopHooks;

    #[async_trait]
    impl EngineHooks for NoopHooks {
        async fn store_events(&self, _events: &[Event]) -> Result<(), String> {
            Ok(())
        }
        fn background(&self, task: futures::future::BoxFuture<'static, ()>) {
            tokio::spawn(task);
        }
        async fn get_rule_match_data(&self, _state: &ConversationState) -> Value {
            Value::Null
        }
        async fn upload_file(
            &self,
            _upload: crate::hooks::FileUpload,
        ) -> Result<crate::hooks::UploadedFile, String> {
            unimplemented!("not exercised by these tests")
        }
    }

    struct StubHost;
    #[async_trait]
    impl ApprovalHost for StubHost {
        async fn request_approval_for_tool_call(&self, _t: &str, _a: &Value, _id: &str) -> String {
            "k".into()
        }
    }

    struct EmptyResolver;
    impl ToolSpecResolver for EmptyResolver {
        fn resolve(&self, _specs: &[agentloom_tools::ToolSpec]) -> Vec<Arc<dyn RuntimeTool>> {
            Vec::new()
        }
    }

    struct EchoTool;
    #[async_trait]
    impl RuntimeTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, args: Value, _ctx: &ToolContext) -> ToolResult {
            Ok(args)
        }
    }

    fn build_engine() -> Arc<Engine<StubProvider>> {
        let pipeline = ReducerPipeline::new(vec![Box::new(agentloom_approval::ApprovalSlice)]).unwrap();
        Arc::new(Engine::new(
            Arc::new(StubProvider),
            Arc::new(NoopHooks),
            Arc::new(StubHost),
            Arc::new(EmptyResolver),
            pipeline,
            EngineConfig::default(),
        ))
    }

    #[tokio::test]
    async fn add_events_before_init_is_rejected() {
        let engine = build_engine();
        let err = engine
            .add_events(vec![PendingEvent::core(CoreEventData::SetSystemPrompt { prompt: "x".into() }, false)])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInitialized));
    }

    #[tokio::test]
    async fn second_initialize_is_rejected() {
        let engine = build_engine();
        engine.initialize_with_events(vec![]).await.unwrap();
        let err = engine.initialize_with_events(vec![]).await.unwrap_err();
        assert!(matches!(err, EngineError::AlreadyInitialized));
    }

    #[tokio::test]
    async fn triggering_event_starts_and_completes_a_run() {
        let engine = build_engine();
        engine.initialize_with_events(vec![]).await.unwrap();

        engine
            .add_events(vec![PendingEvent::core(
                CoreEventData::LlmInputItem {
                    item: json!({
                        "role": "developer",
                        "content": [{"type": "input_text", "text": "User message: hi"}],
                    }),
                },
                true,
            )])
            .await
            .unwrap();

        for _ in 0..20 {
            if !engine.llm_request_in_progress().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!engine.llm_request_in_progress().await);

        let events = engine.events().await;
        assert!(events.iter().any(|e| e.event_type == "CORE:LLM_REQUEST_START"));
        assert!(events.iter().any(|e| e.event_type == "CORE:LLM_REQUEST_END"));
    }

    #[tokio::test]
    async fn infinite_loop_failsafe_pauses_after_threshold() {
        let engine = build_engine();
        engine.initialize_with_events(vec![]).await.unwrap();

        let mut config = EngineConfig::default();
        config.loop_failsafe_threshold = 2;
        let engine = Arc::new(Engine::new(
            Arc::new(StubProvider),
            Arc::new(NoopHooks),
            Arc::new(StubHost),
            Arc::new(EmptyResolver),
            ReducerPipeline::new(vec![Box::new(agentloom_approval::ApprovalSlice)]).unwrap(),
            config,
        ));
        engine.initialize_with_events(vec![]).await.unwrap();

        let mut candidates = vec![PendingEvent::core(
            CoreEventData::LlmInputItem {
                item: json!({
                    "role": "developer",
                    "content": [{"type": "input_text", "text": "User message: go"}],
                }),
            },
            false,
        )];
        for _ in 0..2 {
            candidates.push(PendingEvent::core(
                CoreEventData::LlmInputItem {
                    item: json!({"type": "function_call", "name": "send_message"}),
                },
                true,
            ));
        }
        engine.add_events(candidates).await.unwrap();

        let events = engine.events().await;
        assert!(events.iter().any(|e| e.event_type == "CORE:PAUSE_LLM_REQUESTS"));
        assert!(!events.iter().any(|e| e.event_type == "CORE:LLM_REQUEST_START"));
    }

    #[test]
    fn input_items_to_messages_pairs_calls_with_outputs() {
        let items = vec![
            json!({"type": "function_call", "call_id": "c1", "name": "echo", "arguments": {"x": 1}}),
            json!({"type": "function_call_output", "call_id": "c1", "output": "ok"}),
        ];
        let messages = input_items_to_messages(&items);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0].content, MessageContent::ToolCalls(_)));
        assert!(matches!(messages[1].content, MessageContent::ToolResult(_)));
    }
}
