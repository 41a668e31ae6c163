//! Engine-level configuration.
//!
//! [`EngineConfig`] is a local, engine-owned type rather than a direct
//! dependency on `agentloom_config::EngineSection` (same two fields, `u32`
//! threshold instead of `usize`). See `DESIGN.md`'s Open Question decisions
//! for why the two aren't unified.

use serde::{Deserialize, Serialize};

/// Configuration consumed by [`crate::engine::Engine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The tool name the infinite-loop failsafe treats as "sent a
    /// user-facing message" when counting repeated function calls since the
    /// last user action (spec §4.4 step 6, §9).
    #[serde(default = "default_loop_failsafe_tool_name")]
    pub loop_failsafe_tool_name: String,
    /// How many times `loop_failsafe_tool_name` may be called (with no other
    /// user action in between) before the engine pauses the conversation
    /// (spec §4.4 step 6: 10).
    #[serde(default = "default_loop_failsafe_threshold")]
    pub loop_failsafe_threshold: usize,
}

fn default_loop_failsafe_tool_name() -> String {
    "send_message".to_string()
}

const fn default_loop_failsafe_threshold() -> usize {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            loop_failsafe_tool_name: default_loop_failsafe_tool_name(),
            loop_failsafe_threshold: default_loop_failsafe_threshold(),
        }
    }
}
