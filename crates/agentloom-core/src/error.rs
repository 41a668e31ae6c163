//! The engine's structural-error taxonomy.
//!
//! Per spec §7, errors split into two families: transient failures that
//! become events (tool errors, LLM stream errors) and structural failures
//! that are thrown or returned to the caller (precondition violations, host
//! contract breaches). This type is the latter family.

use thiserror::Error;

/// Structural errors raised by the conversation engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An incoming event failed validation against the combined core ∪
    /// slice schema.
    #[error("event validation failed: {0}")]
    Validation(String),

    /// An incoming event's `type` tag was a `CORE:` discriminant the engine
    /// does not recognize.
    #[error("unknown core event type: {0}")]
    UnknownCoreEvent(String),

    /// A slice reducer raised an error while folding an event.
    #[error("slice reducer {slice} failed on event {event_type}: {reason}")]
    SliceReducerFailed {
        /// The offending slice's name.
        slice: String,
        /// The event type being folded when the failure occurred.
        event_type: String,
        /// The reducer's error message.
        reason: String,
    },

    /// A `LOCAL_FUNCTION_TOOL_CALL` referenced an `associated_reasoning_item_id`
    /// that is not present in `input_items`.
    #[error("associated reasoning item not found: {0}")]
    MissingAssociatedReasoningItem(String),

    /// `initialize_with_events` was called a second time on the same engine.
    #[error("engine already initialized")]
    AlreadyInitialized,

    /// `add_events` was called before `initialize_with_events`.
    #[error("engine not yet initialized")]
    NotInitialized,

    /// Two slices declared a dependency cycle.
    #[error("slice dependency cycle detected among: {0:?}")]
    SliceDependencyCycle(Vec<String>),

    /// A slice declared a dependency on a name used by two different slices.
    #[error("slice dependency conflict for key {0}")]
    SliceDependencyConflict(String),

    /// The host's `store_events` callback failed. In-memory state is already
    /// consistent at the point this is raised (rollback, if any, preceded
    /// persistence) — this only reports the persistence failure upward.
    #[error("failed to persist events: {0}")]
    HostCallbackFailed(String),
}

/// Result type for engine operations that may fail structurally.
pub type EngineResult<T> = Result<T, EngineError>;
