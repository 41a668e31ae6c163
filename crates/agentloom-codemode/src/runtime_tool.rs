//! Wiring the codemode meta-tool into `agentloom-tools`' wrapper-composition
//! model (spec §4.7 step 3).
//!
//! [`CodemodeSubstitution::invoke`] returns a full
//! [`agentloom_tools::ToolInvocationOutcome`] (result, `trigger_llm_request`
//! override, side-channel `add_events`) rather than the plain
//! `Result<Value, ToolError>` [`RuntimeTool::execute`] returns. The
//! [`agentloom_tools::ToolInvoker`] only threads that richer outcome through
//! a [`ToolWrapper`] — the same reason `agentloom-approval`'s suspension
//! logic lives in a wrapper rather than in `execute`. [`CodemodeWrapper`]
//! follows the identical shape: outermost, never calls `next`.

use std::sync::Arc;

use agentloom_tools::{
    Next, RuntimeTool, ToolCallRequest, ToolContext, ToolError, ToolInvocationOutcome, ToolResult,
    ToolSpec, ToolWrapper,
};
use async_trait::async_trait;
use serde_json::Value;

use crate::sandbox::CodemodeSandbox;
use crate::substitution::{codemode_tool_spec, CodemodeSubstitution};

/// The single meta-tool the LLM sees in place of every codemode-eligible
/// tool. Carries no logic of its own — [`CodemodeWrapper`] intercepts every
/// call before `execute` would run.
pub struct CodemodeMetaTool {
    spec: ToolSpec,
    wrappers: Vec<Arc<dyn ToolWrapper>>,
}

impl CodemodeMetaTool {
    /// Build the meta-tool, wrapped by `wrapper`.
    #[must_use]
    pub fn new(wrapper: Arc<CodemodeWrapper>) -> Self {
        Self {
            spec: codemode_tool_spec(),
            wrappers: vec![wrapper],
        }
    }
}

#[async_trait]
impl RuntimeTool for CodemodeMetaTool {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn description(&self) -> &str {
        &self.spec.description
    }

    fn input_schema(&self) -> Value {
        self.spec.input_schema.clone()
    }

    fn wrappers(&self) -> &[Arc<dyn ToolWrapper>] {
        &self.wrappers
    }

    async fn execute(&self, _args: Value, _ctx: &ToolContext) -> ToolResult {
        Err(ToolError::ExecutionFailed(
            "codemode executes via CodemodeWrapper, execute() should be unreachable".into(),
        ))
    }
}

/// Intercepts every call to the codemode meta-tool and runs it through
/// [`CodemodeSubstitution`] instead of the normal wrapper chain.
pub struct CodemodeWrapper {
    substitution: Arc<CodemodeSubstitution>,
    sandbox: Arc<dyn CodemodeSandbox>,
}

impl CodemodeWrapper {
    /// Build a wrapper running `function_code` through `sandbox`.
    #[must_use]
    pub fn new(substitution: Arc<CodemodeSubstitution>, sandbox: Arc<dyn CodemodeSandbox>) -> Self {
        Self { substitution, sandbox }
    }
}

#[async_trait]
impl ToolWrapper for CodemodeWrapper {
    async fn wrap(
        &self,
        _call: &ToolCallRequest,
        args: Value,
        ctx: &ToolContext,
        _next: Next,
    ) -> ToolInvocationOutcome {
        let function_code = args.get("function_code").and_then(Value::as_str).unwrap_or_default();
        let status_indicator_text = args
            .get("status_indicator_text")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match self
            .substitution
            .invoke(self.sandbox.as_ref(), function_code, status_indicator_text, ctx.clone())
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => ToolInvocationOutcome::failure(format!("codemode evaluation failed: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{EvalOutcome, FunctionTable};
    use async_trait::async_trait as local_async_trait;
    use agentloom_tools::ToolCallOutcome;

    struct StubSandbox;

    #[local_async_trait]
    impl CodemodeSandbox for StubSandbox {
        async fn eval(
            &self,
            _code: &str,
            _status_text: &str,
            _functions: FunctionTable,
        ) -> crate::error::CodemodeResult<EvalOutcome> {
            Ok(EvalOutcome {
                result: Value::String("done".into()),
                tool_calls: vec![],
                dynamic_worker_code: None,
            })
        }
    }

    #[tokio::test]
    async fn wrapper_never_calls_next_and_returns_substitution_outcome() {
        let invoker = Arc::new(agentloom_tools::ToolInvoker::new(vec![]));
        let substitution = Arc::new(CodemodeSubstitution::new(invoker, &[]));
        let wrapper = Arc::new(CodemodeWrapper::new(substitution, Arc::new(StubSandbox)));
        let meta_tool = CodemodeMetaTool::new(wrapper);

        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: meta_tool.name().to_string(),
            raw_arguments: serde_json::json!({
                "function_code": "return 1;",
                "status_indicator_text": "working",
            })
            .to_string(),
        };
        let invoker = agentloom_tools::ToolInvoker::new(vec![Arc::new(meta_tool)]);
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => assert_eq!(output, Value::String("done".into())),
            other => panic!("expected success, got {other:?}"),
        }
    }
}
