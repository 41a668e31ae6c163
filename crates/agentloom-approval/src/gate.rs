//! Prepending [`ApprovalWrapper`] onto an already-resolved tool (spec §4.6,
//! §4.8): the decision of *which* tools need gating is the state
//! augmentor's (a tool-policy matcher evaluation), but the mechanics of
//! splicing the wrapper in front of a tool's own chain belong next to the
//! wrapper itself.

use std::sync::Arc;

use agentloom_tools::{RuntimeTool, ToolContext, ToolResult, ToolWrapper};
use async_trait::async_trait;
use serde_json::Value;

use crate::host::ApprovalHost;
use crate::wrapper::ApprovalWrapper;

/// Decorates `inner` so every call runs through `host`'s approval wrapper
/// before `inner`'s own wrapper chain. `"injected-…"` replay ids (see
/// [`crate::is_injected_replay`]) pass straight through — [`ApprovalWrapper`]
/// itself detects and skips those, so no replay bookkeeping is needed here.
pub fn with_approval_gate(inner: Arc<dyn RuntimeTool>, host: Arc<dyn ApprovalHost>) -> Arc<dyn RuntimeTool> {
    Arc::new(ApprovalGatedTool {
        wrappers: vec![Arc::new(ApprovalWrapper::new(host)) as Arc<dyn ToolWrapper>],
        inner,
    })
}

struct ApprovalGatedTool {
    wrappers: Vec<Arc<dyn ToolWrapper>>,
    inner: Arc<dyn RuntimeTool>,
}

#[async_trait]
impl RuntimeTool for ApprovalGatedTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn input_schema(&self) -> Value {
        self.inner.input_schema()
    }

    fn wrappers(&self) -> &[Arc<dyn ToolWrapper>] {
        &self.wrappers
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> ToolResult {
        self.inner.execute(args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_tools::{ToolCallOutcome, ToolCallRequest, ToolInvoker};

    struct StubTool;

    #[async_trait]
    impl RuntimeTool for StubTool {
        fn name(&self) -> &str {
            "delete_file"
        }
        fn description(&self) -> &str {
            "deletes a file"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
            Ok(Value::String("deleted".into()))
        }
    }

    struct StubHost;

    #[async_trait]
    impl ApprovalHost for StubHost {
        async fn request_approval_for_tool_call(&self, _tool_name: &str, _args: &Value, _tool_call_id: &str) -> String {
            "approval-1".to_string()
        }
    }

    #[tokio::test]
    async fn gated_tool_suspends_instead_of_running_inner() {
        let gated = with_approval_gate(Arc::new(StubTool), Arc::new(StubHost));
        let invoker = ToolInvoker::new(vec![gated]);
        let call = ToolCallRequest {
            tool_call_id: "call-1".into(),
            tool_name: "delete_file".into(),
            raw_arguments: "{}".into(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        assert_eq!(outcome.trigger_llm_request, Some(false));
        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => assert_eq!(output["message"], "Tool call needs approval"),
            other => panic!("expected suspension, got {other:?}"),
        }
    }
}
