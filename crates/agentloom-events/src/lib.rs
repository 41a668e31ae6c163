//! The append-only event log for a single conversation (spec §3, §4.1).
//!
//! An [`EventLog`] is the sole source of truth for a conversation: every
//! other component derives its view of the world by folding or replaying
//! this sequence. Events are immutable once appended and are never
//! reordered or removed, only appended to.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod event;
mod kinds;
mod log;
pub mod prelude;
mod slice;

pub use event::{Event, PendingEvent};
pub use kinds::{ContextRule, CoreEventData, FileShareDirection, CORE_EVENT_TYPES};
pub use log::EventLog;
pub use slice::{Slice, StatePatch};
