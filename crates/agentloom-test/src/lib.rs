//! Agentloom Test - shared test utilities for the conversation engine.
//!
//! This crate provides mock implementations and test helpers that can be
//! used across multiple agentloom crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! agentloom-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use agentloom_test::{MockLlmProvider, user_message};
//!
//!     #[tokio::test]
//!     async fn test_stream() {
//!         let provider = MockLlmProvider::new("test-model").with_text_response("hi");
//!         // ... drive the engine with `provider` ...
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mock_llm;

pub use fixtures::*;
pub use harness::*;
pub use mock_llm::*;
