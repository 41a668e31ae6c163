//! Common imports for consumers of `agentloom-core`.

pub use crate::error::{EngineError, EngineResult};
pub use crate::ids::{ConversationId, EventIndex, Timestamp};
pub use crate::text::{first_n_lines, truncate_to_boundary};
