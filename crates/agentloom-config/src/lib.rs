#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered TOML configuration for a hosted agentloom engine.
//!
//! This crate provides a single [`Config`] type loaded from layered TOML
//! files (system, user, workspace) with a validation pass at the end.
//!
//! # Usage
//!
//! ```rust,no_run
//! use agentloom_config::Config;
//!
//! let config = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("Using model: {}", config.model.model);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Workspace** (`{workspace}/.agentloom/config.toml`)
//! 2. **User** (`~/.agentloom/config.toml`)
//! 3. **System** (`/etc/agentloom/config.toml`)
//! 4. **Compiled-in defaults** ([`Config::default()`])
//!
//! # Design
//!
//! This crate has **no dependencies on other internal agentloom crates**. It
//! only depends on `serde`, `toml`, `thiserror`, `tracing`, and `directories`.
//! A host converts [`EngineSection`] into `agentloom_runtime::EngineConfig`
//! at the integration boundary; see `DESIGN.md` for why the two types are
//! kept independent rather than shared.

/// Configuration error types.
pub mod error;
/// Prelude re-exporting this crate's essential types.
pub mod prelude;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::{Config, EngineSection, LoggingSection, ModelSection};

impl Config {
    /// Load configuration with full layered precedence.
    ///
    /// See [`loader::load`] for the full algorithm.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any config file is malformed or the final
    /// configuration fails validation.
    pub fn load(workspace_root: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(workspace_root)
    }

    /// Load configuration from a single file (no layering).
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load_file(path: &std::path::Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
