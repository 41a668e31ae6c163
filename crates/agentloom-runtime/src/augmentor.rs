//! State augmentation (component C3, spec §4.3): deriving the per-read
//! [`AugmentedState`] from a reduced [`ConversationState`].
//!
//! Never cached — every read runs the full procedure again, since context
//! rules and tool policies are re-evaluated against host-supplied match
//! data that can change between reads even with no new event folded.

use std::collections::HashMap;
use std::sync::Arc;

use agentloom_approval::ApprovalHost;
use agentloom_codemode::{
    build_prompt_fragment, CodemodeMetaTool, CodemodeSandbox, CodemodeSubstitution, CodemodeWrapper,
    ToolCallSamples,
};
use agentloom_events::ContextRule;
use agentloom_tools::{RuntimeTool, ToolInvoker, ToolSpec, ToolSpecResolver};
use serde_json::{json, Value};

use crate::matcher;
use crate::state::{AugmentedState, ConversationState};

/// A tool policy parsed out of a context rule's raw `tool_policies` entries
/// (spec §6 "tool policies": `approvalRequired` / `codemode` matchers).
#[derive(Debug, Clone, Default)]
struct ToolPolicy {
    matcher: Option<String>,
    approval_required: bool,
    codemode: bool,
}

fn parse_tool_policies(raw: &[Value]) -> Vec<ToolPolicy> {
    raw.iter()
        .map(|v| ToolPolicy {
            matcher: v.get("matcher").and_then(Value::as_str).map(str::to_string),
            approval_required: v.get("approval_required").and_then(Value::as_bool).unwrap_or(false),
            codemode: v.get("codemode").and_then(Value::as_bool).unwrap_or(false),
        })
        .collect()
}

/// Derives [`AugmentedState`] from a [`ConversationState`] by evaluating
/// context-rule and tool-policy matchers against host-supplied match data,
/// resolving enabled tool specs into runtime tools, and folding
/// codemode-eligible tools into the single codemode meta-tool (spec §4.3,
/// §4.7 step 1).
pub struct StateAugmentor {
    resolver: Arc<dyn ToolSpecResolver>,
    approval_host: Arc<dyn ApprovalHost>,
}

impl StateAugmentor {
    /// Build an augmentor resolving tool specs via `resolver` and gating
    /// approval-required calls through `approval_host`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ToolSpecResolver>, approval_host: Arc<dyn ApprovalHost>) -> Self {
        Self { resolver, approval_host }
    }

    /// Run the full procedure once. `match_data` is host-supplied data
    /// matchers are evaluated against (spec §6). `sandbox` is a freshly
    /// acquired codemode evaluator; it is only used (and only cloned into a
    /// [`CodemodeWrapper`]) when at least one resolved tool is
    /// codemode-eligible this read.
    pub fn augment(&self, state: &ConversationState, match_data: &Value, sandbox: Arc<dyn CodemodeSandbox>) -> AugmentedState {
        let mut enabled_context_rules: Vec<ContextRule> = state
            .context_rules
            .values()
            .filter(|rule| matcher::matches(rule.matcher.as_deref(), match_data))
            .cloned()
            .collect();
        enabled_context_rules.sort_by(|a, b| a.key.cmp(&b.key));

        let mut ephemeral_prompt_fragments = HashMap::new();
        for rule in &enabled_context_rules {
            if let Some(prompt) = &rule.prompt {
                ephemeral_prompt_fragments.insert(rule.key.clone(), prompt.clone());
            }
        }

        let mut tool_specs = Vec::new();
        for rule in &enabled_context_rules {
            for raw in &rule.tools {
                match serde_json::from_value::<ToolSpec>(raw.clone()) {
                    Ok(spec) => tool_specs.push(spec),
                    Err(err) => {
                        tracing::warn!(rule = %rule.key, error = %err, "dropping malformed tool spec");
                    }
                }
            }
        }

        let mcp_servers: Vec<Value> = enabled_context_rules
            .iter()
            .flat_map(|rule| rule.mcp_servers.clone())
            .collect();

        let policies: Vec<ToolPolicy> = enabled_context_rules
            .iter()
            .flat_map(|rule| parse_tool_policies(&rule.tool_policies))
            .collect();

        let resolved = self.resolver.resolve(&tool_specs);

        let mut plain_tools: Vec<Arc<dyn RuntimeTool>> = Vec::new();
        let mut codemode_names = Vec::new();
        let mut codemode_tools: Vec<Arc<dyn RuntimeTool>> = Vec::new();

        for tool in resolved {
            let tool_data = json!({"tool_name": tool.name()});
            let approval_required = policies
                .iter()
                .any(|policy| policy.approval_required && matcher::matches(policy.matcher.as_deref(), &tool_data));
            let codemode_eligible = policies
                .iter()
                .any(|policy| policy.codemode && matcher::matches(policy.matcher.as_deref(), &tool_data));

            let tool: Arc<dyn RuntimeTool> = if approval_required {
                agentloom_approval::with_approval_gate(tool, self.approval_host.clone())
            } else {
                tool
            };

            if codemode_eligible {
                codemode_names.push(tool.name().to_string());
                codemode_tools.push(tool);
            } else {
                plain_tools.push(tool);
            }
        }

        let mut runtime_tools = plain_tools.clone();
        let mut grouped_runtime_tools = HashMap::new();
        grouped_runtime_tools.insert("context-rule".to_string(), plain_tools);

        if !codemode_tools.is_empty() {
            let codemode_specs: Vec<ToolSpec> = tool_specs
                .iter()
                .filter(|spec| codemode_names.contains(&spec.name))
                .cloned()
                .collect();
            let samples = recent_samples(state);
            ephemeral_prompt_fragments.insert(
                "codemode".to_string(),
                build_prompt_fragment(&codemode_specs, &samples),
            );

            let invoker = Arc::new(ToolInvoker::new(codemode_tools));
            let name_refs: Vec<&str> = codemode_names.iter().map(String::as_str).collect();
            let substitution = Arc::new(CodemodeSubstitution::new(invoker, &name_refs));
            let wrapper = Arc::new(CodemodeWrapper::new(substitution, sandbox));
            let meta_tool: Arc<dyn RuntimeTool> = Arc::new(CodemodeMetaTool::new(wrapper));

            runtime_tools.push(meta_tool.clone());
            grouped_runtime_tools.insert("codemode".to_string(), vec![meta_tool]);
        }

        AugmentedState {
            enabled_context_rules,
            ephemeral_prompt_fragments,
            tool_specs,
            runtime_tools,
            grouped_runtime_tools,
            codemode_enabled_tools: codemode_names,
            mcp_servers,
        }
    }
}

fn recent_samples(state: &ConversationState) -> ToolCallSamples {
    let mut samples = ToolCallSamples::new();
    for call in &state.recorded_tool_calls {
        samples.insert(call.tool.clone(), call.output.clone());
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloom_tools::{ToolContext, ToolResult};
    use async_trait::async_trait;

    struct EchoTool(String);

    #[async_trait]
    impl RuntimeTool for EchoTool {
        fn name(&self) -> &str {
            &self.0
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

    struct StubResolver;
    impl ToolSpecResolver for StubResolver {
        fn resolve(&self, specs: &[ToolSpec]) -> Vec<Arc<dyn RuntimeTool>> {
            specs
                .iter()
                .map(|spec| Arc::new(EchoTool(spec.name.clone())) as Arc<dyn RuntimeTool>)
                .collect()
        }
    }

    struct StubHost;
    #[async_trait]
    impl ApprovalHost for StubHost {
        async fn request_approval_for_tool_call(&self, _tool_name: &str, _args: &Value, _tool_call_id: &str) -> String {
            "approval-1".to_string()
        }
    }

    struct StubSandbox;
    #[async_trait]
    impl CodemodeSandbox for StubSandbox {
        async fn eval(
            &self,
            _code: &str,
            _status_text: &str,
            _functions: agentloom_codemode::FunctionTable,
        ) -> agentloom_codemode::CodemodeResult<agentloom_codemode::EvalOutcome> {
            Ok(agentloom_codemode::EvalOutcome {
                result: Value::Null,
                tool_calls: vec![],
                dynamic_worker_code: None,
            })
        }
    }

    fn rule(key: &str, matcher: Option<&str>, tools: Vec<Value>, policies: Vec<Value>) -> ContextRule {
        ContextRule {
            key: key.to_string(),
            matcher: matcher.map(str::to_string),
            prompt: Some(format!("prompt for {key}")),
            tools,
            tool_policies: policies,
            mcp_servers: vec![],
        }
    }

    fn tool_spec_value(name: &str) -> Value {
        json!({"name": name, "description": "d", "input_schema": {"type": "object"}, "is_function": true})
    }

    #[test]
    fn disabled_rule_contributes_nothing() {
        let mut state = ConversationState::empty(&[]);
        state.context_rules.insert(
            "r1".to_string(),
            rule("r1", Some("false"), vec![tool_spec_value("a")], vec![]),
        );
        let augmentor = StateAugmentor::new(Arc::new(StubResolver), Arc::new(StubHost));
        let augmented = augmentor.augment(&state, &Value::Null, Arc::new(StubSandbox));
        assert!(augmented.enabled_context_rules.is_empty());
        assert!(augmented.runtime_tools.is_empty());
    }

    #[test]
    fn enabled_rule_contributes_prompt_and_tool() {
        let mut state = ConversationState::empty(&[]);
        state.context_rules.insert(
            "r1".to_string(),
            rule("r1", None, vec![tool_spec_value("a")], vec![]),
        );
        let augmentor = StateAugmentor::new(Arc::new(StubResolver), Arc::new(StubHost));
        let augmented = augmentor.augment(&state, &Value::Null, Arc::new(StubSandbox));
        assert_eq!(augmented.enabled_context_rules.len(), 1);
        assert_eq!(augmented.ephemeral_prompt_fragments["r1"], "prompt for r1");
        assert_eq!(augmented.runtime_tools.len(), 1);
        assert_eq!(augmented.runtime_tools[0].name(), "a");
    }

    #[test]
    fn codemode_policy_folds_matching_tools_into_meta_tool() {
        let mut state = ConversationState::empty(&[]);
        state.context_rules.insert(
            "r1".to_string(),
            rule(
                "r1",
                None,
                vec![tool_spec_value("a"), tool_spec_value("b")],
                vec![json!({"codemode": true})],
            ),
        );
        let augmentor = StateAugmentor::new(Arc::new(StubResolver), Arc::new(StubHost));
        let augmented = augmentor.augment(&state, &Value::Null, Arc::new(StubSandbox));
        assert_eq!(augmented.codemode_enabled_tools.len(), 2);
        assert_eq!(augmented.runtime_tools.len(), 1);
        assert_eq!(augmented.runtime_tools[0].name(), agentloom_codemode::CODEMODE_TOOL_NAME);
        assert!(augmented.ephemeral_prompt_fragments.contains_key("codemode"));
    }
}
