//! Prelude module - commonly used types for convenient import.
//!
//! Use `use agentloom_runtime::prelude::*;` to import all essential types.

// Engine
pub use crate::{Engine, EngineConfig};

// Host dependencies
pub use crate::{EngineHooks, FileUpload, StreamChunkContext, ToolCallApprovedData, UploadedFile};

// State
pub use crate::{AugmentedState, ConversationState, Participant, RecordedToolCall, ScoredInputItem};

// Reducer pipeline and stream parsing
pub use crate::{ReducerPipeline, StateAugmentor, StreamOutcome, StreamParser};

// Matcher
pub use crate::matches;

// Structural errors
pub use agentloom_core::{EngineError, EngineResult};
