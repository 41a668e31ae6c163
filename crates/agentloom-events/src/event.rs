//! The `Event` and `PendingEvent` types (spec §3).

use agentloom_core::{EventIndex, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kinds::CoreEventData;

/// An event as submitted by a caller of `addEvents`, before index and
/// timestamp assignment.
///
/// Mirrors the shape the teacher's capsule ingress accepts before calling
/// into the kernel — untyped on the wire, validated and stamped on the way
/// in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEvent {
    /// The `"CORE:…"` or `"<SLICE>:…"` discriminant.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The event's payload.
    #[serde(default)]
    pub data: Value,
    /// Arbitrary caller-supplied metadata, merged onto the stamped event.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Whether appending this event should (re-)trigger an LLM request.
    #[serde(default)]
    pub trigger_llm_request: bool,
    /// Caller-supplied dedup key. A repeat within the same log is a no-op.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl PendingEvent {
    /// Build a pending event carrying a typed core payload.
    #[must_use]
    pub fn core(data: CoreEventData, trigger_llm_request: bool) -> Self {
        let event_type = data.type_tag().to_string();
        let data = serde_json::to_value(data).unwrap_or(Value::Null);
        Self {
            event_type,
            data,
            metadata: Map::new(),
            trigger_llm_request,
            idempotency_key: None,
        }
    }

    /// Attach an idempotency key.
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Attach metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// An event once appended to the log: immutable, indexed, timestamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The `"CORE:…"` or `"<SLICE>:…"` discriminant.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The event's payload.
    pub data: Value,
    /// Caller-supplied metadata, as stamped at append time.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// This event's position in the log. Assigned at append time; never
    /// reused, even for skipped duplicates.
    pub event_index: EventIndex,
    /// Wall-clock time of append, UTC.
    pub created_at: Timestamp,
    /// Whether this event's append should (re-)trigger an LLM request.
    #[serde(default)]
    pub trigger_llm_request: bool,
    /// The dedup key this event was appended under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl Event {
    /// `true` if this event's discriminant is in the `"CORE:…"` namespace.
    #[must_use]
    pub fn is_core(&self) -> bool {
        self.event_type.starts_with("CORE:")
    }

    /// Deserialize this event's `data` as a typed core payload.
    ///
    /// Returns `None` for non-core events or core events whose `data` no
    /// longer matches the expected shape (should not happen for events that
    /// passed ingress validation).
    #[must_use]
    pub fn as_core_data(&self) -> Option<CoreEventData> {
        if !self.is_core() {
            return None;
        }
        let mut tagged = self.data.clone();
        if let Value::Object(ref mut map) = tagged {
            map.insert("type".to_string(), Value::String(self.event_type.clone()));
        }
        serde_json::from_value(tagged).ok()
    }
}
