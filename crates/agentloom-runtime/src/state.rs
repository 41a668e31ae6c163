//! Conversation state: the core reduced view (spec §3 "Reduced state") and
//! its per-read augmentation (spec §3 "Augmented state").

use std::collections::HashMap;

use agentloom_core::EventIndex;
use agentloom_events::ContextRule;
use agentloom_tools::{RuntimeTool, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One prior LLM input or output item, with an optional explicit ordering
/// override.
///
/// `sort_score` is set when `LOCAL_FUNCTION_TOOL_CALL` couples a call's two
/// synthetic items to a preceding reasoning item (spec §4.2): the function
/// call gets `reasoningIndex + 0.1`, its output `reasoningIndex + 0.2`. Items
/// without an explicit score sort by their position in `input_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredInputItem {
    /// The raw item, opaque to the core reducer beyond what it inspects to
    /// couple reasoning items to tool calls.
    pub item: Value,
    /// Explicit sort position, when one was assigned.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sort_score: Option<f64>,
}

impl ScoredInputItem {
    /// The score this item sorts by: its explicit score, or its natural
    /// position (spec §6 "input = inputItems sorted by stable score").
    #[must_use]
    pub fn effective_score(&self, natural_position: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        self.sort_score.unwrap_or(natural_position as f64)
    }
}

/// A known participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// The participant's user id.
    pub user_id: String,
    /// Display name, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,
}

/// One recorded tool call, kept as a codemode output sample (spec §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedToolCall {
    /// The tool that was called.
    pub tool: String,
    /// The call's input.
    pub input: Value,
    /// The call's output.
    pub output: Value,
}

/// The core reduced conversation state (spec §3).
///
/// Produced by folding the event log through the core reducer and every
/// registered [`agentloom_events::Slice`] in declaration order
/// ([`crate::pipeline::ReducerPipeline::fold_one`]). Slice-contributed
/// sub-trees live in `slices`, keyed by the slice's own name — `agentloom
/// -approval`'s entries, for instance, surface at `slices["approval"]`
/// rather than as a dedicated top-level field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    /// The system prompt, last set by `SET_SYSTEM_PROMPT`.
    pub system_prompt: String,
    /// Model parameters and tool-choice policy, host-defined.
    pub model_opts: Value,
    /// Mergeable metadata map, including `labels`.
    pub metadata: Map<String, Value>,
    /// Context rules, keyed by `key`.
    pub context_rules: HashMap<String, ContextRule>,
    /// Prior LLM input/output items, in fold order.
    pub input_items: Vec<ScoredInputItem>,
    /// The index of the in-flight `LLM_REQUEST_START`, if any.
    pub llm_request_started_at_index: Option<EventIndex>,
    /// Whether the next read should start a new LLM request.
    pub trigger_llm_request: bool,
    /// Whether LLM request triggering is suspended.
    pub paused: bool,
    /// Known participants, by user id.
    pub participants: HashMap<String, Participant>,
    /// Participants mentioned but not (yet) joined, by user id.
    pub mentioned_participants: HashMap<String, Participant>,
    /// Tool calls recorded for codemode sampling, oldest first.
    pub recorded_tool_calls: Vec<RecordedToolCall>,
    /// Slice-contributed sub-trees, keyed by slice name.
    pub slices: Map<String, Value>,
}

impl ConversationState {
    /// The state immediately after `initialize_with_events` resets every
    /// registered slice to its `initial_patch` (spec §4.5).
    #[must_use]
    pub fn empty(slice_initial_patches: &[( &'static str, Value)]) -> Self {
        let mut slices = Map::new();
        for (name, patch) in slice_initial_patches {
            slices.insert((*name).to_string(), patch.clone());
        }
        Self {
            system_prompt: String::new(),
            model_opts: Value::Object(Map::new()),
            metadata: Map::new(),
            context_rules: HashMap::new(),
            input_items: Vec::new(),
            llm_request_started_at_index: None,
            trigger_llm_request: false,
            paused: false,
            participants: HashMap::new(),
            mentioned_participants: HashMap::new(),
            recorded_tool_calls: Vec::new(),
            slices,
        }
    }

    /// `input_items` sorted by effective score, stable on ties (spec §6).
    #[must_use]
    pub fn sorted_input_items(&self) -> Vec<&Value> {
        let mut indexed: Vec<(f64, &Value)> = self
            .input_items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.effective_score(i), &item.item))
            .collect();
        indexed.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        indexed.into_iter().map(|(_, item)| item).collect()
    }

    /// The last input item that looks like a developer message whose first
    /// `input_text` begins with `"User mentioned"` or `"User message"`, used
    /// as the infinite-loop failsafe's counting boundary (spec §4.4 step 6).
    #[must_use]
    pub fn last_user_action_index(&self) -> Option<usize> {
        self.input_items.iter().rposition(|scored| {
            let item = &scored.item;
            if item.get("role").and_then(Value::as_str) != Some("developer") {
                return false;
            }
            let Some(text) = first_input_text(item) else {
                return false;
            };
            text.starts_with("User mentioned") || text.starts_with("User message")
        })
    }

    /// Count of `name`-matching function-call items strictly after
    /// `since_index` (spec §4.4 step 6's infinite-loop failsafe).
    #[must_use]
    pub fn function_calls_named_since(&self, name: &str, since_index: Option<usize>) -> usize {
        let start = since_index.map_or(0, |i| i + 1);
        self.input_items[start.min(self.input_items.len())..]
            .iter()
            .filter(|scored| {
                let item = &scored.item;
                item.get("type").and_then(Value::as_str) == Some("function_call")
                    && item.get("name").and_then(Value::as_str) == Some(name)
            })
            .count()
    }
}

fn first_input_text(item: &Value) -> Option<&str> {
    item.get("content")?
        .as_array()?
        .iter()
        .find_map(|part| {
            if part.get("type").and_then(Value::as_str) == Some("input_text") {
                part.get("text").and_then(Value::as_str)
            } else {
                None
            }
        })
}

/// The per-read derived view layered on top of [`ConversationState`] (spec
/// §3 "Augmented state", §4.3). Never cached: recomputed by
/// [`crate::augmentor::StateAugmentor::augment`] on every read.
#[derive(Clone)]
pub struct AugmentedState {
    /// Context rules whose matcher evaluated true this read.
    pub enabled_context_rules: Vec<ContextRule>,
    /// Prompt fragments keyed by origin (rule key, or `"codemode"`).
    pub ephemeral_prompt_fragments: HashMap<String, String>,
    /// Aggregated tool specs from enabled rules, before codemode
    /// substitution.
    pub tool_specs: Vec<ToolSpec>,
    /// Tools actually offered to the LLM this read, after codemode
    /// substitution (spec §4.7 step 2).
    pub runtime_tools: Vec<Arc<dyn RuntimeTool>>,
    /// `runtime_tools`, grouped by contributing origin (e.g.
    /// `"context-rule"`).
    pub grouped_runtime_tools: HashMap<String, Vec<Arc<dyn RuntimeTool>>>,
    /// Names of tools folded into the codemode meta-tool this read.
    pub codemode_enabled_tools: Vec<String>,
    /// MCP-style server declarations aggregated from enabled context rules.
    pub mcp_servers: Vec<Value>,
}

impl std::fmt::Debug for AugmentedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AugmentedState")
            .field("enabled_context_rules", &self.enabled_context_rules.len())
            .field(
                "ephemeral_prompt_fragments",
                &self.ephemeral_prompt_fragments.keys().collect::<Vec<_>>(),
            )
            .field("tool_specs", &self.tool_specs.len())
            .field("runtime_tools", &self.runtime_tools.len())
            .field("codemode_enabled_tools", &self.codemode_enabled_tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_items(items: Vec<Value>) -> ConversationState {
        let mut state = ConversationState::empty(&[]);
        state.input_items = items
            .into_iter()
            .map(|item| ScoredInputItem { item, sort_score: None })
            .collect();
        state
    }

    #[test]
    fn sorted_input_items_honors_explicit_scores_over_position() {
        let mut state = ConversationState::empty(&[]);
        state.input_items = vec![
            ScoredInputItem { item: Value::String("first".into()), sort_score: None },
            ScoredInputItem { item: Value::String("bumped".into()), sort_score: Some(0.05) },
        ];
        let sorted = state.sorted_input_items();
        assert_eq!(sorted[0], &Value::String("bumped".into()));
    }

    #[test]
    fn last_user_action_index_matches_prefix_rule() {
        let state = state_with_items(vec![
            serde_json::json!({"role": "developer", "content": [{"type": "input_text", "text": "System note"}]}),
            serde_json::json!({"role": "developer", "content": [{"type": "input_text", "text": "User message: hi"}]}),
            serde_json::json!({"role": "assistant", "content": []}),
        ]);
        assert_eq!(state.last_user_action_index(), Some(1));
    }

    #[test]
    fn function_calls_named_since_counts_only_after_boundary() {
        let state = state_with_items(vec![
            serde_json::json!({"type": "function_call", "name": "send_message"}),
            serde_json::json!({"role": "developer", "content": [{"type": "input_text", "text": "User message: hi"}]}),
            serde_json::json!({"type": "function_call", "name": "send_message"}),
            serde_json::json!({"type": "function_call", "name": "send_message"}),
        ]);
        let boundary = state.last_user_action_index();
        assert_eq!(state.function_calls_named_since("send_message", boundary), 2);
    }
}
