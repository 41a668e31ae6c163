//! Codemode substitution (component C7, spec §4.7): replacing many tools
//! with one meta-tool that accepts LLM-generated code.

use std::collections::HashMap;
use std::sync::Arc;

use agentloom_events::{CoreEventData, PendingEvent};
use agentloom_tools::{
    ToolCallRequest, ToolCallOutcome, ToolContext, ToolInvocationOutcome, ToolInvoker, ToolSpec,
};
use serde_json::{json, Value};

use crate::declarations::{generate_declarations, ToolCallSamples};
use crate::error::CodemodeResult;
use crate::sandbox::{CodemodeSandbox, FunctionTable, HostCallResult, HostFn};
use crate::identifiers::resolve_export_collisions;

/// The name of the single meta-tool the LLM sees in place of every
/// codemode-eligible tool.
pub const CODEMODE_TOOL_NAME: &str = "codemode";

/// Fixed rules embedded in the codemode prompt fragment (spec §4.7 step 1).
/// The generated type surface is spliced in at `{{DECLARATIONS}}`.
const FRAGMENT_TEMPLATE: &str = "\
You can call the tools below from a single JavaScript program instead of \
issuing one call per tool. Write an async function named `codemode` and \
return its result.

Rules:
- Do not wrap calls in try/catch; let errors propagate.
- Prefer `Promise.all` for independent calls instead of sequential `await`.
- Always use the return value of a call; never assume a call's side effect \
alone is enough.
- Hard-code the inputs you already know; do not invent values you were not \
given.

{{DECLARATIONS}}
";

/// Builds the codemode meta-tool's declaration schema and prompt fragment
/// from a set of tools selected for codemode substitution (spec §4.7 step
/// 1). Selection itself — which tools are codemode-eligible this read — is
/// the caller's responsibility (driven by the tool-policy matcher, spec §6).
#[must_use]
pub fn build_prompt_fragment(tools: &[ToolSpec], samples: &ToolCallSamples) -> String {
    let declarations = generate_declarations(tools, samples);
    FRAGMENT_TEMPLATE.replace("{{DECLARATIONS}}", &declarations)
}

/// The JSON schema for the codemode meta-tool's two string parameters.
#[must_use]
pub fn codemode_tool_spec() -> ToolSpec {
    ToolSpec {
        name: CODEMODE_TOOL_NAME.to_string(),
        description: "Run a JavaScript program that calls one or more tools.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "function_code": {
                    "type": "string",
                    "description": "The body of an async function named codemode."
                },
                "status_indicator_text": {
                    "type": "string",
                    "description": "A short present-tense status shown to the user while this runs."
                }
            },
            "required": ["function_code", "status_indicator_text"]
        }),
        is_function: true,
    }
}

/// Coordinates one codemode invocation: builds the function table from the
/// codemode-eligible tools, runs the generated program in a sandbox, and
/// folds the inner calls' outcomes into a single [`ToolInvocationOutcome`]
/// (spec §4.7 step 3).
pub struct CodemodeSubstitution {
    invoker: Arc<ToolInvoker>,
    export_to_tool: HashMap<String, String>,
}

impl CodemodeSubstitution {
    /// Build a substitution for the given codemode-eligible tool names,
    /// resolving export-name collisions the same way the declarations were
    /// generated (spec §4.7 step 1).
    #[must_use]
    pub fn new(invoker: Arc<ToolInvoker>, tool_names: &[&str]) -> Self {
        let export_to_tool = resolve_export_collisions(tool_names)
            .into_iter()
            .map(|(original, exported)| (exported, original))
            .collect();
        Self {
            invoker,
            export_to_tool,
        }
    }

    /// Run `function_code` inside `sandbox`, dispatching every call it makes
    /// back through the tool invoker, and combine the results per spec §4.7
    /// step 3e's `trigger_llm_request` override: `true` if any inner call
    /// requested it, `false` if any inner call explicitly refused it (and
    /// none requested it), otherwise deferred to the engine default.
    pub async fn invoke(
        &self,
        sandbox: &dyn CodemodeSandbox,
        function_code: &str,
        status_indicator_text: &str,
        ctx: ToolContext,
    ) -> CodemodeResult<ToolInvocationOutcome> {
        let functions = self.build_function_table(ctx);
        let outcome = sandbox
            .eval(function_code, status_indicator_text, functions)
            .await?;

        let mut trigger: Option<bool> = None;
        let mut add_events = Vec::new();
        for call in &outcome.tool_calls {
            if let Some(requested) = call.get("trigger_llm_request").and_then(Value::as_bool) {
                trigger = Some(match trigger {
                    Some(true) => true,
                    _ if requested => true,
                    Some(existing) => existing,
                    None => requested,
                });
            }
        }

        add_events.push(PendingEvent::core(
            CoreEventData::CodemodeToolCalls {
                data: outcome.tool_calls.clone(),
            },
            false,
        ));

        Ok(ToolInvocationOutcome {
            tool_call_result: ToolCallOutcome::Success {
                output: outcome.result,
            },
            trigger_llm_request: trigger,
            add_events,
        })
    }

    fn build_function_table(&self, ctx: ToolContext) -> FunctionTable {
        let mut table = FunctionTable::new();
        for (export_name, tool_name) in &self.export_to_tool {
            let invoker = self.invoker.clone();
            let tool_name = tool_name.clone();
            let ctx = ctx.clone();
            let thunk: HostFn = Arc::new(move |args: Value| {
                let invoker = invoker.clone();
                let tool_name = tool_name.clone();
                let ctx = ctx.clone();
                Box::pin(async move {
                    let call = ToolCallRequest {
                        tool_call_id: format!("codemode-{tool_name}"),
                        tool_name: tool_name.clone(),
                        raw_arguments: args.to_string(),
                    };
                    let outcome = invoker.invoke(&call, &ctx).await;
                    let to_js = match outcome.tool_call_result {
                        ToolCallOutcome::Success { output } => output,
                        ToolCallOutcome::Error { error } => json!({"error": error}),
                    };
                    HostCallResult {
                        to_js,
                        trigger_llm_request: outcome.trigger_llm_request,
                    }
                })
            });
            table.insert(export_name.clone(), thunk);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_embeds_generated_declarations() {
        let tools = vec![ToolSpec {
            name: "ping".to_string(),
            description: "pings".to_string(),
            input_schema: json!({"type": "object"}),
            is_function: true,
        }];
        let fragment = build_prompt_fragment(&tools, &ToolCallSamples::new());
        assert!(fragment.contains("declare function ping("));
        assert!(fragment.contains("Promise.all"));
    }

    #[test]
    fn export_table_maps_back_to_original_tool_names() {
        let table = resolve_export_collisions(&["read.file", "read-file"]);
        let export_to_tool: HashMap<String, String> = table
            .into_iter()
            .map(|(original, exported)| (exported, original))
            .collect();
        assert_eq!(
            export_to_tool.get("read_file").map(String::as_str),
            Some("read-file")
        );
        assert_eq!(
            export_to_tool.get("read_file__2").map(String::as_str),
            Some("read.file")
        );
    }
}
