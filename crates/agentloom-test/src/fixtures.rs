//! Test fixtures for common types.

use agentloom_core::{ConversationId, EventIndex, Timestamp};
use agentloom_llm::{LlmToolDefinition, Message, ToolCall, ToolCallResult};

/// Create a test conversation id.
#[must_use]
pub fn test_conversation_id() -> ConversationId {
    ConversationId::new()
}

/// Create a test event index at the given position.
#[must_use]
pub fn test_event_index(position: u64) -> EventIndex {
    EventIndex(position)
}

/// Create a timestamp for use in fixtures that don't care about a specific
/// instant, just that one is present.
#[must_use]
pub fn test_timestamp() -> Timestamp {
    Timestamp::now()
}

/// Build a user message with the given text.
#[must_use]
pub fn user_message(text: impl Into<String>) -> Message {
    Message::user(text)
}

/// Build an assistant message requesting a single tool call.
#[must_use]
pub fn assistant_tool_call_message(id: impl Into<String>, name: impl Into<String>) -> Message {
    Message::assistant_with_tools(vec![ToolCall::new(id, name)])
}

/// Build a successful tool result message.
#[must_use]
pub fn tool_result_message(call_id: impl Into<String>, content: impl Into<String>) -> Message {
    Message::tool_result(ToolCallResult::success(call_id, content))
}

/// Build a minimal tool definition with an object schema accepting any
/// properties.
#[must_use]
pub fn test_tool_definition(name: impl Into<String>) -> LlmToolDefinition {
    LlmToolDefinition::new(name).with_description("test tool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_ids_are_distinct() {
        assert_ne!(test_conversation_id(), test_conversation_id());
    }

    #[test]
    fn event_index_fixture_carries_position() {
        assert_eq!(test_event_index(3), EventIndex(3));
    }

    #[test]
    fn assistant_tool_call_message_carries_one_call() {
        let message = assistant_tool_call_message("call-1", "send_message");
        let calls = message.tool_calls().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "send_message");
    }
}
