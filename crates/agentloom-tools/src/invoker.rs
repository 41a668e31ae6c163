//! The tool invoker (component C6, spec §4.6).

use std::collections::HashMap;
use std::sync::Arc;

use agentloom_core::first_n_lines;
use serde_json::Value;

use crate::error::ToolError;
use crate::tool::{
    BoxFuture, RuntimeTool, ToolCallOutcome, ToolCallRequest, ToolContext, ToolInvocationOutcome,
};

const STACK_LINES: usize = 3;

/// Resolves calls by name, composes each tool's wrapper chain, executes it,
/// and normalizes the result.
pub struct ToolInvoker {
    tools: HashMap<String, Arc<dyn RuntimeTool>>,
}

impl ToolInvoker {
    /// Build an invoker over this read's resolved runtime tools.
    #[must_use]
    pub fn new(tools: Vec<Arc<dyn RuntimeTool>>) -> Self {
        let tools = tools
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self { tools }
    }

    /// Look up a tool by name, for callers (e.g. codemode's function table)
    /// that need the tool itself rather than a full invocation.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn RuntimeTool>> {
        self.tools.get(name).cloned()
    }

    /// Resolve, wrap, execute, and normalize one call.
    pub async fn invoke(
        &self,
        call: &ToolCallRequest,
        ctx: &ToolContext,
    ) -> ToolInvocationOutcome {
        let Some(tool) = self.tools.get(&call.tool_name).cloned() else {
            return ToolInvocationOutcome::failure(format!(
                "Tool not found or not local: {}",
                call.tool_name
            ));
        };

        let args = parse_arguments(&call.raw_arguments);
        let chain = build_chain(tool, call.clone(), ctx.clone());
        chain(args).await
    }
}

fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }
    serde_json::from_str(raw).unwrap_or(Value::Object(serde_json::Map::new()))
}

/// Compose `tool`'s wrapper list (innermost last) around its `execute`,
/// returning a single callable that runs the whole chain for one call.
fn build_chain(
    tool: Arc<dyn RuntimeTool>,
    call: ToolCallRequest,
    ctx: ToolContext,
) -> Arc<dyn Fn(Value) -> BoxFuture + Send + Sync> {
    let innermost = {
        let tool = tool.clone();
        let ctx = ctx.clone();
        let execute: Arc<dyn Fn(Value) -> BoxFuture + Send + Sync> = Arc::new(move |args| {
            let tool = tool.clone();
            let ctx = ctx.clone();
            Box::pin(async move {
                match tool.execute(args, &ctx).await {
                    Ok(output) => ToolInvocationOutcome::success(output),
                    Err(err) => ToolInvocationOutcome::failure(normalize_error(tool.name(), &err)),
                }
            })
        });
        execute
    };

    tool.wrappers()
        .iter()
        .rev()
        .cloned()
        .fold(innermost, |next, wrapper| {
            let call = call.clone();
            let ctx = ctx.clone();
            Arc::new(move |args: Value| {
                let wrapper = wrapper.clone();
                let next = next.clone();
                let ctx = ctx.clone();
                let call = call.clone();
                Box::pin(async move { wrapper.wrap(&call, args, &ctx, next).await })
            })
        })
}

/// `"Error in tool <name>: <message>\n<top3StackLines>"`, stack omitted for
/// schema-validation errors (spec §4.6).
fn normalize_error(tool_name: &str, err: &ToolError) -> String {
    let head = format!("Error in tool {tool_name}: {err}");
    if err.omits_stack() {
        return head;
    }
    let stack = first_n_lines(&format!("{err:?}"), STACK_LINES);
    if stack.is_empty() {
        head
    } else {
        format!("{head}\n{stack}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{Next, ToolWrapper};
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl RuntimeTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its input"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, args: Value, _ctx: &ToolContext) -> crate::error::ToolResult {
            Ok(args)
        }
    }

    struct FailingTool;

    #[async_trait]
    impl RuntimeTool for FailingTool {
        fn name(&self) -> &str {
            "boom"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _args: Value, _ctx: &ToolContext) -> crate::error::ToolResult {
            Err(ToolError::ExecutionFailed("disk on fire".into()))
        }
    }

    struct DoublingWrapper;

    #[async_trait]
    impl ToolWrapper for DoublingWrapper {
        async fn wrap(
            &self,
            _call: &ToolCallRequest,
            args: Value,
            ctx: &ToolContext,
            next: Next,
        ) -> ToolInvocationOutcome {
            let mut outcome = next(args).await;
            if let ToolCallOutcome::Success { output } = &mut outcome.tool_call_result {
                if let Some(n) = output.get("n").and_then(Value::as_i64) {
                    *output = json!({"n": n * 2});
                }
            }
            outcome
        }
    }

    struct WrappedEchoTool {
        wrappers: Vec<Arc<dyn ToolWrapper>>,
    }

    #[async_trait]
    impl RuntimeTool for WrappedEchoTool {
        fn name(&self) -> &str {
            "wrapped_echo"
        }
        fn description(&self) -> &str {
            "echoes, doubled"
        }
        fn input_schema(&self) -> Value {
            json!({"type": "object"})
        }
        fn wrappers(&self) -> &[Arc<dyn ToolWrapper>] {
            &self.wrappers
        }
        async fn execute(&self, args: Value, _ctx: &ToolContext) -> crate::error::ToolResult {
            Ok(args)
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_not_found() {
        let invoker = ToolInvoker::new(vec![]);
        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: "nope".into(),
            raw_arguments: "{}".into(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Error { error } => {
                assert_eq!(error, "Tool not found or not local: nope");
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_arguments_parse_as_empty_object() {
        let invoker = ToolInvoker::new(vec![Arc::new(EchoTool)]);
        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: "echo".into(),
            raw_arguments: String::new(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => assert_eq!(output, json!({})),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execution_failure_is_normalized_with_a_stack_snippet() {
        let invoker = ToolInvoker::new(vec![Arc::new(FailingTool)]);
        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: "boom".into(),
            raw_arguments: "{}".into(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Error { error } => {
                assert!(error.starts_with("Error in tool boom: Execution failed: disk on fire"));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_arguments_error_omits_stack() {
        struct StrictTool;
        #[async_trait]
        impl RuntimeTool for StrictTool {
            fn name(&self) -> &str {
                "strict"
            }
            fn description(&self) -> &str {
                "rejects bad input"
            }
            fn input_schema(&self) -> Value {
                json!({"type": "object"})
            }
            async fn execute(&self, _args: Value, _ctx: &ToolContext) -> crate::error::ToolResult {
                Err(ToolError::InvalidArguments("missing field `path`".into()))
            }
        }

        let invoker = ToolInvoker::new(vec![Arc::new(StrictTool)]);
        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: "strict".into(),
            raw_arguments: "{}".into(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Error { error } => {
                assert_eq!(
                    error,
                    "Error in tool strict: Invalid arguments: missing field `path`"
                );
                assert!(!error.contains('\n'));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn wrapper_runs_around_execute() {
        let tool = WrappedEchoTool {
            wrappers: vec![Arc::new(DoublingWrapper)],
        };
        let invoker = ToolInvoker::new(vec![Arc::new(tool)]);
        let call = ToolCallRequest {
            tool_call_id: "1".into(),
            tool_name: "wrapped_echo".into(),
            raw_arguments: json!({"n": 21}).to_string(),
        };
        let outcome = invoker.invoke(&call, &ToolContext::default()).await;
        match outcome.tool_call_result {
            ToolCallOutcome::Success { output } => assert_eq!(output, json!({"n": 42})),
            other => panic!("expected success, got {other:?}"),
        }
    }
}
