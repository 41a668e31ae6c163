//! The core reducer and the pluggable [`ReducerPipeline`] built around it
//! (component C2, spec §4.2).

use std::collections::{HashMap, HashSet};

use agentloom_core::{EngineError, EngineResult};
use agentloom_events::{CoreEventData, Event, Slice};
use serde_json::{Map, Value};

use crate::state::{ConversationState, Participant, RecordedToolCall, ScoredInputItem};

/// Recursive merge used for `SET_METADATA` and for folding a slice's patch
/// into its own sub-tree: objects merge key-wise, everything else
/// (including arrays) is replaced wholesale.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                deep_merge(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target, patch) => {
            *target = patch.clone();
        }
    }
}

const CORE_STATE_FIELDS: &[&str] = &[
    "system_prompt",
    "model_opts",
    "metadata",
    "context_rules",
    "input_items",
    "llm_request_started_at_index",
    "trigger_llm_request",
    "paused",
    "participants",
    "mentioned_participants",
    "recorded_tool_calls",
];

/// Fold one event into `state` via the core reducer, reproducing every
/// bullet of the spec's core-reducer semantics without modification.
pub fn fold_core(state: &ConversationState, event: &Event) -> EngineResult<ConversationState> {
    let mut next = state.clone();

    if event.trigger_llm_request && !next.paused {
        next.trigger_llm_request = true;
    }

    let Some(data) = event.as_core_data() else {
        if event.is_core() {
            tracing::warn!(event_type = %event.event_type, "unrecognized core event, state unchanged");
        }
        return Ok(next);
    };

    match data {
        CoreEventData::InitializedWithEvents { .. } => {}

        CoreEventData::SetSystemPrompt { prompt } => {
            next.system_prompt = prompt;
        }

        CoreEventData::AddContextRules { rules } => {
            for rule in rules {
                next.context_rules.insert(rule.key.clone(), rule);
            }
        }

        CoreEventData::SetModelOpts { model_opts } => {
            next.model_opts = model_opts;
        }

        CoreEventData::SetMetadata { metadata } => {
            let mut target = Value::Object(next.metadata.clone());
            deep_merge(&mut target, &metadata);
            next.metadata = match target {
                Value::Object(map) => map,
                _ => next.metadata.clone(),
            };
        }

        CoreEventData::AddLabel { label } => {
            let labels = next
                .metadata
                .entry("labels")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(labels) = labels {
                if !labels.iter().any(|l| l.as_str() == Some(label.as_str())) {
                    labels.push(Value::String(label));
                }
            }
        }

        CoreEventData::LlmInputItem { item } | CoreEventData::LlmOutputItem { item } => {
            next.input_items.push(ScoredInputItem { item, sort_score: None });
        }

        CoreEventData::LlmRequestStart { .. } => {
            next.llm_request_started_at_index = Some(event.event_index);
            next.trigger_llm_request = false;
        }

        CoreEventData::LlmRequestEnd { .. } | CoreEventData::LlmRequestCancel { .. } => {
            next.llm_request_started_at_index = None;
        }

        CoreEventData::LocalFunctionToolCall {
            call,
            result,
            associated_reasoning_item_id,
            ..
        } => {
            fold_local_function_tool_call(&mut next, call, result, associated_reasoning_item_id)?;
        }

        CoreEventData::CodemodeToolCalls { data } => {
            for entry in data {
                next.recorded_tool_calls.push(RecordedToolCall {
                    tool: entry
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input: entry.get("args").cloned().unwrap_or(Value::Null),
                    output: entry.get("output").cloned().unwrap_or(Value::Null),
                });
            }
        }

        CoreEventData::PauseLlmRequests { .. } => {
            next.paused = true;
            next.trigger_llm_request = false;
        }

        CoreEventData::ResumeLlmRequests {} => {
            next.paused = false;
        }

        CoreEventData::FileShared {
            file_id,
            provider_file_id,
            direction,
        } => {
            let files = next
                .metadata
                .entry("shared_files")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(files) = files {
                files.push(serde_json::json!({
                    "file_id": file_id,
                    "provider_file_id": provider_file_id,
                    "direction": direction,
                }));
            }
        }

        CoreEventData::MessageFromAgent { text } => {
            let messages = next
                .metadata
                .entry("agent_messages")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(messages) = messages {
                messages.push(Value::String(text));
            }
        }

        CoreEventData::ParticipantJoined { user_id, display_name } => {
            next.mentioned_participants.remove(&user_id);
            next.participants.insert(
                user_id.clone(),
                Participant { user_id, display_name },
            );
        }

        CoreEventData::ParticipantLeft { user_id } => {
            next.participants.remove(&user_id);
        }

        CoreEventData::ParticipantMentioned { user_id } => {
            next.mentioned_participants
                .entry(user_id.clone())
                .or_insert(Participant { user_id, display_name: None });
        }

        CoreEventData::ToolCallApprovalRequested {
            approval_key,
            tool_name,
            ..
        } => {
            let message = agentloom_approval::pending_call_message(&tool_name, &approval_key);
            push_developer_message(&mut next, &message);
        }

        CoreEventData::ToolCallApproved { approval_key, approved } => {
            fold_tool_call_approved(&mut next, state, &approval_key, approved);
        }

        CoreEventData::InternalError { .. } | CoreEventData::Log { .. } | CoreEventData::BackgroundTaskProgress { .. } => {}
    }

    Ok(next)
}

fn fold_local_function_tool_call(
    next: &mut ConversationState,
    call: Value,
    result: Value,
    associated_reasoning_item_id: Option<String>,
) -> EngineResult<()> {
    let call_id = call
        .get("call_id")
        .or_else(|| call.get("id"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let output_text = match &result {
        Value::String(s) => s.clone(),
        Value::Object(obj) if obj.contains_key("error") => obj
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("tool call failed")
            .to_string(),
        other => serde_json::to_string(other).unwrap_or_default(),
    };
    let output_item = serde_json::json!({
        "type": "function_call_output",
        "call_id": call_id,
        "output": output_text,
    });

    let mut call_score = None;
    let mut output_score = None;

    if let Some(ref reasoning_id) = associated_reasoning_item_id {
        let reasoning_index = next.input_items.iter().position(|scored| {
            scored.item.get("type").and_then(Value::as_str) == Some("reasoning")
                && scored.item.get("id").and_then(Value::as_str) == Some(reasoning_id.as_str())
        });
        let Some(reasoning_index) = reasoning_index else {
            return Err(EngineError::MissingAssociatedReasoningItem(reasoning_id.clone()));
        };
        #[allow(clippy::cast_precision_loss)]
        let base = reasoning_index as f64;
        call_score = Some(base + 0.1);
        output_score = Some(base + 0.2);
    }

    next.input_items.push(ScoredInputItem { item: call, sort_score: call_score });
    next.input_items.push(ScoredInputItem { item: output_item, sort_score: output_score });
    Ok(())
}

fn push_developer_message(next: &mut ConversationState, text: &str) {
    next.input_items.push(ScoredInputItem {
        item: serde_json::json!({
            "role": "developer",
            "content": [{"type": "input_text", "text": text}],
        }),
        sort_score: None,
    });
}

fn fold_tool_call_approved(
    next: &mut ConversationState,
    prior: &ConversationState,
    approval_key: &str,
    approved: bool,
) {
    let entries = prior
        .slices
        .get("approval")
        .and_then(|a| a.get("entries"))
        .and_then(Value::as_object);

    let Some(entries) = entries else {
        push_developer_message(next, &agentloom_approval::missing_key_diagnostic(approval_key, &[]));
        return;
    };

    let Some(entry) = entries.get(approval_key) else {
        let known: Vec<String> = entries.keys().cloned().collect();
        push_developer_message(next, &agentloom_approval::missing_key_diagnostic(approval_key, &known));
        return;
    };

    let is_pending = entry.get("status").and_then(Value::as_str) == Some("pending");
    if !is_pending {
        return;
    }

    push_developer_message(next, &agentloom_approval::approval_outcome_message(approval_key, approved));
    if !next.paused {
        next.trigger_llm_request = true;
    }
}

/// Assembles the core reducer with every registered slice and folds events
/// through both in order (spec §4.2).
pub struct ReducerPipeline {
    slices: Vec<Box<dyn Slice>>,
}

impl ReducerPipeline {
    /// Build a pipeline over `slices`, validating at construction time that
    /// no two slices share a name and that no slice's declared dependencies
    /// form a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SliceDependencyConflict`] if two slices share a
    /// name, or [`EngineError::SliceDependencyCycle`] if dependencies cycle.
    pub fn new(slices: Vec<Box<dyn Slice>>) -> EngineResult<Self> {
        let mut seen = HashSet::new();
        for slice in &slices {
            if !seen.insert(slice.name()) {
                return Err(EngineError::SliceDependencyConflict(slice.name().to_string()));
            }
        }

        let names: HashMap<&str, &[&str]> = slices
            .iter()
            .map(|s| (s.name(), s.dependencies()))
            .collect();
        for slice in &slices {
            detect_cycle(slice.name(), &names, &mut Vec::new(), &mut HashSet::new())?;
        }

        Ok(Self { slices })
    }

    /// The `slices` sub-tree's initial state, before any event is folded
    /// (used to build the empty [`ConversationState`] at construction and on
    /// `initialize_with_events` reset).
    #[must_use]
    pub fn initial_slice_patches(&self) -> Vec<(&'static str, Value)> {
        self.slices.iter().map(|s| (s.name(), s.initial_patch())).collect()
    }

    /// Declared slice discriminants, for [`agentloom_events::EventLog::register_slice_event_types`].
    #[must_use]
    pub fn slice_names(&self) -> Vec<&'static str> {
        self.slices.iter().map(|s| s.name()).collect()
    }

    /// Fold one event: core reducer, then every slice in declaration order,
    /// deep-merging each slice's patch into its own sub-tree before the
    /// whole merged state is reconstituted as a fresh [`ConversationState`].
    pub fn fold_one(&self, state: &ConversationState, event: &Event) -> EngineResult<ConversationState> {
        let next = fold_core(state, event)?;

        let mut merged = serde_json::to_value(&next)
            .map_err(|e| EngineError::Validation(format!("state serialization failed: {e}")))?;
        if let Value::Object(ref mut map) = merged {
            if let Some(Value::Object(slice_values)) = map.remove("slices") {
                for (key, value) in slice_values {
                    map.insert(key, value);
                }
            }
        }

        for slice in &self.slices {
            let deps = collect_deps(&merged, slice.dependencies());
            let patch = slice.reduce(&merged, &deps, event).map_err(|reason| {
                EngineError::SliceReducerFailed {
                    slice: slice.name().to_string(),
                    event_type: event.event_type.clone(),
                    reason,
                }
            })?;

            if let Value::Object(ref mut map) = merged {
                let entry = map.entry(slice.name()).or_insert(Value::Object(Map::new()));
                deep_merge(entry, &patch);
            }
        }

        reconstitute(&merged)
    }
}

fn collect_deps(merged: &Value, dependency_names: &[&'static str]) -> Value {
    let mut deps = Map::new();
    if let Value::Object(map) = merged {
        for name in dependency_names {
            if let Some(value) = map.get(*name) {
                deps.insert((*name).to_string(), value.clone());
            }
        }
    }
    Value::Object(deps)
}

fn reconstitute(merged: &Value) -> EngineResult<ConversationState> {
    let mut core: ConversationState = serde_json::from_value(merged.clone())
        .map_err(|e| EngineError::Validation(format!("state deserialization failed: {e}")))?;

    let mut slices = Map::new();
    if let Value::Object(map) = merged {
        for (key, value) in map {
            if !CORE_STATE_FIELDS.contains(&key.as_str()) {
                slices.insert(key.clone(), value.clone());
            }
        }
    }
    core.slices = slices;
    Ok(core)
}

fn detect_cycle(
    start: &'static str,
    names: &HashMap<&'static str, &[&'static str]>,
    path: &mut Vec<&'static str>,
    visited: &mut HashSet<&'static str>,
) -> EngineResult<()> {
    if path.contains(&start) {
        let mut cycle: Vec<String> = path.iter().map(|s| (*s).to_string()).collect();
        cycle.push(start.to_string());
        return Err(EngineError::SliceDependencyCycle(cycle));
    }
    if !visited.insert(start) {
        return Ok(());
    }
    path.push(start);
    if let Some(deps) = names.get(start) {
        for dep in *deps {
            detect_cycle(dep, names, path, visited)?;
        }
    }
    path.pop();
    Ok(())
}
