//! The append-only event log (component C1).

use std::collections::HashSet;

use agentloom_core::{EngineError, EngineResult, EventIndex, Timestamp};

use crate::event::{Event, PendingEvent};
use crate::kinds::CORE_EVENT_TYPES;

/// An in-memory, append-only sequence of events.
///
/// `events[i].event_index == i` is maintained as an invariant of this type;
/// nothing outside `append_one`/`append_many` is permitted to mutate
/// `events`. Mirrors the teacher's `EventBus` in spirit — a single append
/// point that downstream readers observe — but replaces the broadcast/fan-out
/// delivery with durable, replayable storage plus a borrowed `snapshot`.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
    seen_idempotency_keys: HashSet<String>,
    extra_slice_types: HashSet<String>,
}

impl EventLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously persisted events, without re-validating
    /// or re-indexing them. Used by `initialize_with_events` crash recovery.
    #[must_use]
    pub fn from_persisted(events: Vec<Event>) -> Self {
        let seen_idempotency_keys = events
            .iter()
            .filter_map(|e| e.idempotency_key.clone())
            .collect();
        Self {
            events,
            seen_idempotency_keys,
            extra_slice_types: HashSet::new(),
        }
    }

    /// Declare additional non-core discriminants (contributed by slices) as
    /// known, so ingress validation does not need to warn on them.
    pub fn register_slice_event_types(&mut self, types: impl IntoIterator<Item = String>) {
        self.extra_slice_types.extend(types);
    }

    /// All events appended so far, in index order.
    #[must_use]
    pub fn snapshot(&self) -> &[Event] {
        &self.events
    }

    /// The index the next appended event will receive.
    #[must_use]
    pub fn next_index(&self) -> EventIndex {
        #[allow(clippy::cast_possible_truncation)]
        EventIndex(self.events.len() as u64)
    }

    /// All events with `event_index < index`.
    pub fn replay_up_to(&self, index: EventIndex) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.event_index < index)
    }

    /// Validate, stamp, and append a single event.
    ///
    /// Returns `Ok(None)` if the event was a no-op because its idempotency
    /// key had already been seen. Returns `Ok(Some(event))` with the
    /// stamped event otherwise.
    pub fn append_one(&mut self, pending: PendingEvent) -> EngineResult<Option<&Event>> {
        if let Some(ref key) = pending.idempotency_key {
            if self.seen_idempotency_keys.contains(key) {
                tracing::debug!(idempotency_key = %key, "skipping duplicate event");
                return Ok(None);
            }
        }

        self.validate(&pending)?;

        let event = Event {
            event_type: pending.event_type,
            data: pending.data,
            metadata: pending.metadata,
            event_index: self.next_index(),
            created_at: Timestamp::now(),
            trigger_llm_request: pending.trigger_llm_request,
            idempotency_key: pending.idempotency_key,
        };

        if let Some(ref key) = event.idempotency_key {
            self.seen_idempotency_keys.insert(key.clone());
        }
        self.events.push(event);
        Ok(self.events.last())
    }

    /// Validate, stamp, and append a batch of events atomically: either all
    /// events are appended (less any idempotency no-ops) or, on the first
    /// validation failure, the log is left exactly as it was before the
    /// call.
    pub fn append_many(
        &mut self,
        pending: Vec<PendingEvent>,
    ) -> EngineResult<Vec<Event>> {
        let checkpoint = self.events.len();
        let mut appended = Vec::with_capacity(pending.len());

        for p in pending {
            match self.append_one(p) {
                Ok(Some(event)) => appended.push(event.clone()),
                Ok(None) => {}
                Err(err) => {
                    self.rollback_to(checkpoint);
                    return Err(err);
                }
            }
        }

        Ok(appended)
    }

    /// Remove every event with index `>= checkpoint`, un-seeing their
    /// idempotency keys. Exposed for callers (the engine's `add_events`)
    /// that fold events one at a time and need to undo a partially-applied
    /// batch when a later event in it fails to fold.
    pub fn rollback_to(&mut self, checkpoint: usize) {
        for event in self.events.drain(checkpoint..) {
            if let Some(ref key) = event.idempotency_key {
                self.seen_idempotency_keys.remove(key);
            }
        }
    }

    fn validate(&self, pending: &PendingEvent) -> EngineResult<()> {
        if pending.event_type.starts_with("CORE:") {
            if !CORE_EVENT_TYPES.contains(&pending.event_type.as_str()) {
                return Err(EngineError::UnknownCoreEvent(pending.event_type.clone()));
            }
            return Ok(());
        }

        if !self.extra_slice_types.contains(&pending.event_type) {
            tracing::warn!(
                event_type = %pending.event_type,
                "appending event with an undeclared slice discriminant"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::CoreEventData;
    use serde_json::json;

    fn set_prompt(prompt: &str) -> PendingEvent {
        PendingEvent::core(
            CoreEventData::SetSystemPrompt {
                prompt: prompt.to_string(),
            },
            false,
        )
    }

    #[test]
    fn append_one_assigns_sequential_indices() {
        let mut log = EventLog::new();
        let first = log.append_one(set_prompt("a")).unwrap().unwrap().event_index;
        let second = log.append_one(set_prompt("b")).unwrap().unwrap().event_index;
        assert_eq!(first, EventIndex(0));
        assert_eq!(second, EventIndex(1));
    }

    #[test]
    fn unknown_core_event_type_is_rejected() {
        let mut log = EventLog::new();
        let bad = PendingEvent {
            event_type: "CORE:NOT_A_REAL_KIND".into(),
            data: json!({}),
            metadata: Default::default(),
            trigger_llm_request: false,
            idempotency_key: None,
        };
        let err = log.append_one(bad).unwrap_err();
        assert!(matches!(err, EngineError::UnknownCoreEvent(_)));
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn unknown_slice_event_type_is_accepted_with_a_warning() {
        let mut log = EventLog::new();
        let slice_event = PendingEvent {
            event_type: "BILLING:INVOICE_PAID".into(),
            data: json!({"amount": 100}),
            metadata: Default::default(),
            trigger_llm_request: false,
            idempotency_key: None,
        };
        let appended = log.append_one(slice_event).unwrap();
        assert!(appended.is_some());
    }

    #[test]
    fn repeated_idempotency_key_is_a_silent_skip() {
        let mut log = EventLog::new();
        let event = set_prompt("a").with_idempotency_key("dedup-1");
        let first = log.append_one(event.clone()).unwrap();
        assert!(first.is_some());
        let second = log.append_one(event).unwrap();
        assert!(second.is_none());
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn append_many_rolls_back_atomically_on_validation_failure() {
        let mut log = EventLog::new();
        let batch = vec![
            set_prompt("a"),
            PendingEvent {
                event_type: "CORE:BOGUS".into(),
                data: json!({}),
                metadata: Default::default(),
                trigger_llm_request: false,
                idempotency_key: None,
            },
        ];
        let err = log.append_many(batch).unwrap_err();
        assert!(matches!(err, EngineError::UnknownCoreEvent(_)));
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn append_many_skips_duplicates_without_breaking_the_batch() {
        let mut log = EventLog::new();
        let event = set_prompt("a").with_idempotency_key("dedup-2");
        log.append_one(event.clone()).unwrap();

        let batch = vec![event, set_prompt("b")];
        let appended = log.append_many(batch).unwrap();
        assert_eq!(appended.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }

    #[test]
    fn from_persisted_preserves_idempotency_keys_for_future_dedup() {
        let mut log = EventLog::new();
        log.append_one(set_prompt("a").with_idempotency_key("k")).unwrap();
        let rebuilt = EventLog::from_persisted(log.snapshot().to_vec());
        let result = rebuilt
            .seen_idempotency_keys
            .contains("k");
        assert!(result);
    }
}
