//! Prelude module - commonly used types for convenient import.
//!
//! Use `use agentloom_config::prelude::*;` to import all essential types.

pub use crate::{Config, ConfigError, ConfigResult, EngineSection, LoggingSection, ModelSection};
