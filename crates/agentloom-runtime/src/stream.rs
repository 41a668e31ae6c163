//! Translating a provider's [`StreamEvent`] sequence into the engine's
//! output items and tool-call events (spec §4.5.1).
//!
//! Grounded on `astrid-runtime/src/runtime/execution.rs`'s `run_turn_streaming`:
//! that loop drains the whole stream first (text/tool-call accumulation,
//! `Done`/`Error` handling), then executes the collected tool calls
//! afterward. This parser keeps that same two-phase shape. The one
//! deliberate departure from spec §4.5.1's literal text: that section
//! describes tool-call promises starting *while the stream is still
//! producing text* and later output being queued until the promises drain.
//! Since every provider observed in this workspace streams strictly before
//! any tool runs (as in `execution.rs` above), there is never text to queue
//! behind an in-flight call — tool calls here run after the stream
//! completes, concurrently with each other via [`futures::future::join_all`],
//! which reproduces the same end state (all calls resolved before the next
//! read) without the added complexity of interleaving two live streams.

use std::sync::Arc;

use agentloom_core::EventIndex;
use agentloom_events::{CoreEventData, FileShareDirection, PendingEvent};
use agentloom_llm::{LlmResult, StreamBox, StreamEvent};
use agentloom_tools::{ToolCallOutcome, ToolCallRequest, ToolContext, ToolInvocationOutcome, ToolInvoker};
use futures::StreamExt;
use serde_json::{json, Value};

use crate::hooks::{EngineHooks, FileUpload, StreamChunkContext};

/// Tool names treated as image-generation calls for the purposes of spec
/// §4.5.1's `FILE_SHARED` handling. Grounded on the name the provider SDKs
/// observed across this workspace use for their built-in image tool.
const IMAGE_GENERATION_TOOL_NAMES: &[&str] = &["image_generation"];

/// One tool call accumulated from `ToolCallStart`/`ToolCallDelta`/`ToolCallEnd`.
struct PendingToolCall {
    id: String,
    name: String,
    raw_arguments: String,
    associated_reasoning_item_id: Option<String>,
}

/// What the last flushed (or started) output item was, for associating a
/// tool call with an immediately preceding reasoning item (spec §4.5.1).
#[derive(Clone, PartialEq, Eq)]
enum LastItem {
    Reasoning(String),
    Other,
}

/// What [`StreamParser::consume`] produced: output items and tool-call
/// records ready to be appended as events, in emission order.
#[derive(Default)]
pub struct StreamOutcome {
    /// `LLM_OUTPUT_ITEM`/`LOCAL_FUNCTION_TOOL_CALL` events to append, in order.
    pub events: Vec<PendingEvent>,
    /// Raw token usage, if the provider reported it.
    pub usage: Option<(usize, usize)>,
    /// Whether the stream ended with at least one output item or tool call.
    pub produced_output: bool,
}

/// Consumes one provider stream for a single `LLM_REQUEST_START` batch.
pub struct StreamParser {
    invoker: Arc<ToolInvoker>,
    tool_ctx: ToolContext,
    hooks: Arc<dyn EngineHooks>,
    batch_id: EventIndex,
}

impl StreamParser {
    /// Build a parser for one run, invoking completed tool calls through
    /// `invoker` with `tool_ctx`.
    #[must_use]
    pub fn new(invoker: Arc<ToolInvoker>, tool_ctx: ToolContext, hooks: Arc<dyn EngineHooks>, batch_id: EventIndex) -> Self {
        Self { invoker, tool_ctx, hooks, batch_id }
    }

    /// Drain `stream`, then run every accumulated tool call concurrently.
    ///
    /// # Errors
    ///
    /// Propagates the provider's own stream error (`StreamEvent::Error` or a
    /// transport failure) to the caller, which folds it into
    /// `LLM_REQUEST_CANCEL` rather than a tool-level event (spec §4.5).
    pub async fn consume(&self, mut stream: StreamBox) -> LlmResult<StreamOutcome> {
        let mut events = Vec::new();
        let mut usage = None;

        let mut text_buf = String::new();
        let mut reasoning_buf = String::new();
        let mut last_item = LastItem::Other;
        let mut reasoning_counter = 0usize;

        let mut pending_calls: Vec<PendingToolCall> = Vec::new();
        let mut current_args = String::new();
        let mut active_function_calls = 0usize;

        while let Some(event) = stream.next().await {
            let event = event?;
            self.hooks.on_llm_stream_response_streaming_chunk(
                &event_to_chunk(&event),
                StreamChunkContext { batch_id: self.batch_id, active_function_calls },
            );

            match event {
                StreamEvent::TextDelta(delta) => {
                    flush_reasoning(&mut reasoning_buf, &mut reasoning_counter, &mut events, &mut last_item);
                    text_buf.push_str(&delta);
                }
                StreamEvent::ReasoningDelta(delta) => {
                    flush_text(&mut text_buf, &mut events, &mut last_item);
                    reasoning_buf.push_str(&delta);
                }
                StreamEvent::ToolCallStart { id, name } => {
                    flush_text(&mut text_buf, &mut events, &mut last_item);
                    let associated_reasoning_item_id = match &last_item {
                        LastItem::Reasoning(reasoning_id) if reasoning_buf.is_empty() => Some(reasoning_id.clone()),
                        _ => None,
                    };
                    flush_reasoning(&mut reasoning_buf, &mut reasoning_counter, &mut events, &mut last_item);
                    current_args.clear();
                    pending_calls.push(PendingToolCall {
                        id,
                        name,
                        raw_arguments: String::new(),
                        associated_reasoning_item_id,
                    });
                    active_function_calls += 1;
                    last_item = LastItem::Other;
                }
                StreamEvent::ToolCallDelta { id, args_delta } => {
                    if let Some(call) = pending_calls.iter_mut().find(|c| c.id == id) {
                        call.raw_arguments.push_str(&args_delta);
                    } else {
                        current_args.push_str(&args_delta);
                    }
                }
                StreamEvent::ToolCallEnd { .. } => {}
                StreamEvent::Usage { input_tokens, output_tokens } => {
                    usage = Some((input_tokens, output_tokens));
                }
                StreamEvent::Done => break,
                StreamEvent::Error(message) => {
                    return Err(agentloom_llm::LlmError::StreamingError(message));
                }
            }
        }

        flush_text(&mut text_buf, &mut events, &mut last_item);
        flush_reasoning(&mut reasoning_buf, &mut reasoning_counter, &mut events, &mut last_item);

        let produced_output = !events.is_empty() || !pending_calls.is_empty();

        if !pending_calls.is_empty() {
            let outcomes = futures::future::join_all(pending_calls.iter().map(|call| {
                let request = ToolCallRequest {
                    tool_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    raw_arguments: call.raw_arguments.clone(),
                };
                let invoker = self.invoker.clone();
                let ctx = self.tool_ctx.clone();
                async move { invoker.invoke(&request, &ctx).await }
            }))
            .await;

            for (call, outcome) in pending_calls.into_iter().zip(outcomes) {
                if IMAGE_GENERATION_TOOL_NAMES.contains(&call.name.as_str()) {
                    events.extend(self.handle_image_generation(&call, outcome).await);
                } else {
                    events.extend(outcome.add_events.clone());
                    events.push(tool_call_event(&call, &outcome, self.batch_id));
                }
            }
        }

        Ok(StreamOutcome { events, usage, produced_output })
    }

    /// Spec §4.5.1: for a completed image-generation call, upload the
    /// decoded image via the host and emit `FILE_SHARED` referencing both
    /// file ids, with the base64 payload stripped.
    async fn handle_image_generation(&self, call: &PendingToolCall, outcome: ToolInvocationOutcome) -> Vec<PendingEvent> {
        let mut events = outcome.add_events.clone();

        let ToolCallOutcome::Success { output } = &outcome.tool_call_result else {
            events.push(tool_call_event(call, &outcome, self.batch_id));
            return events;
        };

        let Some(encoded) = output.get("image_base64").and_then(Value::as_str) else {
            events.push(tool_call_event(call, &outcome, self.batch_id));
            return events;
        };

        let content = match base64_decode(encoded) {
            Ok(bytes) => bytes,
            Err(_) => {
                events.push(tool_call_event(call, &outcome, self.batch_id));
                return events;
            }
        };

        let filename = output.get("filename").and_then(Value::as_str).unwrap_or("image.png").to_string();
        let mime_type = output.get("mime_type").and_then(Value::as_str).map(str::to_string);
        let provider_file_id = output.get("provider_file_id").and_then(Value::as_str).map(str::to_string);

        let mut metadata = output.clone();
        if let Value::Object(ref mut map) = metadata {
            map.remove("image_base64");
        }

        let content_length = u64::try_from(content.len()).ok();
        match self
            .hooks
            .upload_file(FileUpload {
                content_length,
                content,
                filename,
                mime_type,
                metadata,
            })
            .await
        {
            Ok(uploaded) => {
                events.push(PendingEvent::core(
                    CoreEventData::FileShared {
                        file_id: uploaded.file_id,
                        provider_file_id: provider_file_id.or(uploaded.provider_file_id),
                        direction: FileShareDirection::FromAgentToUser,
                    },
                    false,
                ));
            }
            Err(error) => {
                tracing::error!(call_id = %call.id, error = %error, "failed to upload generated image");
                events.push(tool_call_event(
                    call,
                    &ToolInvocationOutcome::failure(format!("failed to upload generated image: {error}")),
                    self.batch_id,
                ));
            }
        }

        events
    }
}

fn base64_decode(encoded: &str) -> Result<Vec<u8>, ()> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(encoded).map_err(|_| ())
}

fn flush_text(buf: &mut String, events: &mut Vec<PendingEvent>, last_item: &mut LastItem) {
    if buf.is_empty() {
        return;
    }
    let text = std::mem::take(buf);
    events.push(PendingEvent::core(
        CoreEventData::LlmOutputItem {
            item: json!({
                "type": "message",
                "role": "assistant",
                "content": [{"type": "output_text", "text": text}],
            }),
        },
        false,
    ));
    *last_item = LastItem::Other;
}

fn flush_reasoning(
    buf: &mut String,
    counter: &mut usize,
    events: &mut Vec<PendingEvent>,
    last_item: &mut LastItem,
) {
    if buf.is_empty() {
        return;
    }
    let text = std::mem::take(buf);
    *counter += 1;
    let id = format!("reasoning-{counter}");
    events.push(PendingEvent::core(
        CoreEventData::LlmOutputItem {
            item: json!({"type": "reasoning", "id": id, "text": text}),
        },
        false,
    ));
    *last_item = LastItem::Reasoning(id);
}

fn tool_call_event(call: &PendingToolCall, outcome: &ToolInvocationOutcome, batch_id: EventIndex) -> PendingEvent {
    let args: Value = serde_json::from_str(&call.raw_arguments).unwrap_or(Value::Null);
    let call_item = json!({
        "type": "function_call",
        "call_id": call.id,
        "name": call.name,
        "arguments": args,
    });

    let result = match &outcome.tool_call_result {
        ToolCallOutcome::Success { output } => output.clone(),
        ToolCallOutcome::Error { error } => json!({"error": error}),
    };

    PendingEvent::core(
        CoreEventData::LocalFunctionToolCall {
            call: call_item,
            result,
            execution_time_ms: 0,
            associated_reasoning_item_id: call.associated_reasoning_item_id.clone(),
            llm_request_start_event_index: batch_id.0,
        },
        outcome.trigger_llm_request.unwrap_or(true),
    )
}

fn event_to_chunk(event: &StreamEvent) -> Value {
    serde_json::to_value(event).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_tools::{RuntimeTool, ToolResult};
    use async_trait::async_trait;
    use futures::stream;

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

    struct NoopHooks;

    #[async_trait]
    impl EngineHooks for NoopHooks {
        async fn store_events(&self, _events: &[agentloom_events::Event]) -> Result<(), String> {
            Ok(())
        }
        fn background(&self, _task: futures::future::BoxFuture<'static, ()>) {}
        async fn get_rule_match_data(&self, _state: &crate::state::ConversationState) -> Value {
            Value::Null
        }
        async fn upload_file(&self, _upload: crate::hooks::FileUpload) -> Result<crate::hooks::UploadedFile, String> {
            unimplemented!()
        }
    }

    fn events_stream(events: Vec<StreamEvent>) -> StreamBox {
        Box::pin(stream::iter(events.into_iter().map(Ok)))
    }

    #[tokio::test]
    async fn text_only_stream_emits_one_message_item() {
        let invoker = Arc::new(ToolInvoker::new(vec![]));
        let parser = StreamParser::new(invoker, ToolContext::default(), Arc::new(NoopHooks), EventIndex(0));
        let outcome = parser
            .consume(events_stream(vec![
                StreamEvent::TextDelta("hello ".into()),
                StreamEvent::TextDelta("world".into()),
                StreamEvent::Done,
            ]))
            .await
            .unwrap();
        assert_eq!(outcome.events.len(), 1);
        assert!(outcome.produced_output);
    }

    #[tokio::test]
    async fn reasoning_immediately_before_a_call_is_associated() {
        let invoker = Arc::new(ToolInvoker::new(vec![Arc::new(EchoTool)]));
        let parser = StreamParser::new(invoker, ToolContext::default(), Arc::new(NoopHooks), EventIndex(2));
        let outcome = parser
            .consume(events_stream(vec![
                StreamEvent::ReasoningDelta("thinking".into()),
                StreamEvent::ToolCallStart { id: "call-1".into(), name: "echo".into() },
                StreamEvent::ToolCallDelta { id: "call-1".into(), args_delta: "{}".into() },
                StreamEvent::ToolCallEnd { id: "call-1".into() },
                StreamEvent::Done,
            ]))
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 2);
        let data: CoreEventData =
            serde_json::from_value(outcome.events[1].data.clone()).expect("expected core event data");
        let CoreEventData::LocalFunctionToolCall { associated_reasoning_item_id, llm_request_start_event_index, .. } = data
        else {
            panic!("expected a tool call event");
        };
        assert_eq!(associated_reasoning_item_id, Some("reasoning-1".into()));
        assert_eq!(llm_request_start_event_index, 2);
    }

    #[tokio::test]
    async fn second_call_with_no_intervening_reasoning_is_not_associated() {
        let invoker = Arc::new(ToolInvoker::new(vec![Arc::new(EchoTool)]));
        let parser = StreamParser::new(invoker, ToolContext::default(), Arc::new(NoopHooks), EventIndex(0));
        let outcome = parser
            .consume(events_stream(vec![
                StreamEvent::ReasoningDelta("thinking".into()),
                StreamEvent::ToolCallStart { id: "call-1".into(), name: "echo".into() },
                StreamEvent::ToolCallEnd { id: "call-1".into() },
                StreamEvent::ToolCallStart { id: "call-2".into(), name: "echo".into() },
                StreamEvent::ToolCallEnd { id: "call-2".into() },
                StreamEvent::Done,
            ]))
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 3);
    }
}
