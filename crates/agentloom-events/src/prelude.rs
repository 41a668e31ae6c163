//! Common imports for consumers of `agentloom-events`.

pub use crate::{
    ContextRule, CoreEventData, Event, EventLog, FileShareDirection, PendingEvent, Slice,
    StatePatch, CORE_EVENT_TYPES,
};
