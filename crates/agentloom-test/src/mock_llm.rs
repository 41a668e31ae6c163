//! A scriptable [`LlmProvider`] for exercising the stream-parsing and
//! run-discipline paths without a live provider SDK.

use std::collections::VecDeque;
use std::sync::Mutex;

use agentloom_llm::{
    LlmProvider, LlmResult, LlmToolDefinition, Message, StreamBox, StreamEvent,
};
use async_trait::async_trait;

/// An [`LlmProvider`] that replays a queue of pre-scripted event sequences.
///
/// Each call to [`LlmProvider::stream`] pops the next queued sequence and
/// replays it verbatim; once the queue is empty it falls back to a single
/// `Done` event, so a test that doesn't care about response content can
/// construct one with [`MockLlmProvider::new`] and never touch the queue.
pub struct MockLlmProvider {
    name: String,
    model: String,
    queued_responses: Mutex<VecDeque<Vec<StreamEvent>>>,
    /// Every call's messages/tools/system prompt, in invocation order, for
    /// assertions about what the engine actually sent upstream.
    calls: Mutex<Vec<CapturedCall>>,
}

/// A single recorded `stream()` invocation.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    /// Messages passed to this call.
    pub messages: Vec<Message>,
    /// Tool definitions passed to this call.
    pub tools: Vec<LlmToolDefinition>,
    /// System prompt passed to this call.
    pub system: String,
}

impl MockLlmProvider {
    /// Create a provider with no queued responses (every call streams a bare
    /// `Done`).
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            name: "mock".to_owned(),
            model: model.into(),
            queued_responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a sequence of events to be replayed by the next `stream()` call.
    #[must_use]
    pub fn with_response(self, events: Vec<StreamEvent>) -> Self {
        self.queued_responses
            .lock()
            .expect("mock provider mutex poisoned")
            .push_back(events);
        self
    }

    /// Queue a plain text response terminated with `Done`.
    #[must_use]
    pub fn with_text_response(self, text: impl Into<String>) -> Self {
        self.with_response(vec![StreamEvent::TextDelta(text.into()), StreamEvent::Done])
    }

    /// All calls made to this provider so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().expect("mock provider mutex poisoned").clone()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(
        &self,
        messages: &[Message],
        tools: &[LlmToolDefinition],
        system: &str,
    ) -> LlmResult<StreamBox> {
        self.calls
            .lock()
            .expect("mock provider mutex poisoned")
            .push(CapturedCall {
                messages: messages.to_vec(),
                tools: tools.to_vec(),
                system: system.to_owned(),
            });

        let events = self
            .queued_responses
            .lock()
            .expect("mock provider mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| vec![StreamEvent::Done]);

        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[LlmToolDefinition],
        _system: &str,
    ) -> LlmResult<agentloom_llm::LlmResponse> {
        Ok(agentloom_llm::LlmResponse {
            message: Message::assistant(String::new()),
            has_tool_calls: false,
            stop_reason: agentloom_llm::StopReason::EndTurn,
            usage: agentloom_llm::Usage::default(),
        })
    }

    fn max_context_length(&self) -> usize {
        200_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn replays_queued_events_in_order() {
        let provider = MockLlmProvider::new("test-model").with_text_response("hello");

        let mut stream = provider.stream(&[], &[], "").await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event.unwrap());
        }

        assert!(matches!(events[0], StreamEvent::TextDelta(ref s) if s == "hello"));
        assert!(matches!(events[1], StreamEvent::Done));
    }

    #[tokio::test]
    async fn falls_back_to_done_when_queue_is_empty() {
        let provider = MockLlmProvider::new("test-model");
        let mut stream = provider.stream(&[], &[], "").await.unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert!(matches!(first, StreamEvent::Done));
    }

    #[tokio::test]
    async fn records_every_call() {
        let provider = MockLlmProvider::new("test-model");
        provider.stream(&[Message::user("hi")], &[], "sys").await.unwrap();
        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "sys");
    }
}
