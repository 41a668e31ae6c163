//! Prelude module - commonly used types for convenient import.
//!
//! Use `use agentloom_test::prelude::*;` to import all essential types.

pub use crate::fixtures::*;
pub use crate::harness::*;
pub use crate::mock_llm::*;
