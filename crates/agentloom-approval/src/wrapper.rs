//! The approval wrapper (spec §4.6 "wrapping", §4.8).

use std::sync::Arc;

use agentloom_events::{CoreEventData, PendingEvent};
use agentloom_tools::{Next, ToolCallOutcome, ToolCallRequest, ToolContext, ToolInvocationOutcome, ToolWrapper};
use async_trait::async_trait;
use serde_json::{json, Value};

use crate::host::ApprovalHost;
use crate::types::is_injected_replay;

/// Suspends execution and emits an approval request instead of running the
/// wrapped chain.
///
/// Injected as the outermost wrapper whenever an enabled tool policy's
/// `approvalRequired` matcher evaluates true for a tool. `"injected-…"`
/// replay ids (see [`is_injected_replay`]) bypass suspension and run the
/// chain directly — that is how an approved call actually executes, so the
/// escape hatch lives in `wrap` itself rather than in whether the wrapper
/// was attached. The chain is never re-entered for a freshly suspended
/// call: re-execution after approval is a new call the host replays with an
/// `"injected-…"` id.
pub struct ApprovalWrapper {
    host: Arc<dyn ApprovalHost>,
}

impl ApprovalWrapper {
    /// Wrap `host` as a tool wrapper.
    #[must_use]
    pub fn new(host: Arc<dyn ApprovalHost>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl ToolWrapper for ApprovalWrapper {
    async fn wrap(
        &self,
        call: &ToolCallRequest,
        args: Value,
        _ctx: &ToolContext,
        next: Next,
    ) -> ToolInvocationOutcome {
        if is_injected_replay(&call.tool_call_id) {
            return next(args).await;
        }

        let approval_key = self
            .host
            .request_approval_for_tool_call(&call.tool_name, &args, &call.tool_call_id)
            .await;

        let requested = PendingEvent::core(
            CoreEventData::ToolCallApprovalRequested {
                approval_key,
                tool_name: call.tool_name.clone(),
                args,
                tool_call_id: call.tool_call_id.clone(),
            },
            false,
        );

        ToolInvocationOutcome {
            tool_call_result: ToolCallOutcome::Success {
                output: json!({"message": "Tool call needs approval"}),
            },
            trigger_llm_request: Some(false),
            add_events: vec![requested],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubHost;

    #[async_trait]
    impl ApprovalHost for StubHost {
        async fn request_approval_for_tool_call(
            &self,
            _tool_name: &str,
            _args: &Value,
            _tool_call_id: &str,
        ) -> String {
            "approval-1".to_string()
        }
    }

    #[tokio::test]
    async fn wrapper_suspends_and_never_calls_next() {
        let wrapper = ApprovalWrapper::new(Arc::new(StubHost));
        let call = ToolCallRequest {
            tool_call_id: "call-1".into(),
            tool_name: "delete_file".into(),
            raw_arguments: "{}".into(),
        };
        let next: Next = Arc::new(|_args| {
            Box::pin(async { panic!("next should not be called when approval suspends") })
        });

        let outcome = wrapper.wrap(&call, json!({"path": "/tmp/x"}), &ToolContext::default(), next).await;

        assert_eq!(outcome.trigger_llm_request, Some(false));
        assert_eq!(outcome.add_events.len(), 1);
        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => {
                assert_eq!(output["message"], "Tool call needs approval");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn injected_replay_skips_suspension_and_calls_next() {
        let wrapper = ApprovalWrapper::new(Arc::new(StubHost));
        let call = ToolCallRequest {
            tool_call_id: "injected-call-1".into(),
            tool_name: "delete_file".into(),
            raw_arguments: "{}".into(),
        };
        let next: Next = Arc::new(|args| Box::pin(async move { ToolInvocationOutcome::success(args) }));

        let outcome = wrapper.wrap(&call, json!({"path": "/tmp/x"}), &ToolContext::default(), next).await;

        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => assert_eq!(output, json!({"path": "/tmp/x"})),
            other => panic!("expected the replayed call to run, got {other:?}"),
        }
    }
}
