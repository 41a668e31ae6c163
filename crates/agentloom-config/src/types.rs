//! Configuration types for the agentloom conversation engine.
//!
//! All types in this module are self-contained with no dependencies on other
//! internal agentloom crates — `agentloom-runtime` depends on this crate,
//! never the reverse. Every struct implements [`Default`] with sensible
//! production defaults so that a bare `[section]` header in TOML produces a
//! working configuration.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for a hosted engine.
///
/// Loaded from layered TOML files (system, user, workspace) with environment
/// variable fallbacks. Every section defaults to a working configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider selection and request defaults.
    pub model: ModelSection,
    /// Engine behaviour not otherwise carried on [`ConversationState`]
    /// (infinite-loop failsafe).
    ///
    /// [`ConversationState`]: https://docs.rs/agentloom-runtime
    pub engine: EngineSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ModelSection
// ---------------------------------------------------------------------------

/// LLM provider selection and request defaults.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    /// Provider identifier (e.g. `"claude"`, `"openai"`).
    pub provider: String,
    /// Model name sent to the provider API.
    pub model: String,
    /// API key. Prefer environment variables over storing this in a file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL for the provider API (overrides the default endpoint).
    #[serde(skip_serializing)]
    pub api_url: Option<String>,
    /// Maximum tokens to request per completion.
    pub max_tokens: usize,
    /// Sampling temperature.
    pub temperature: f64,
}

impl std::fmt::Debug for ModelSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSection")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("has_api_url", &self.api_url.is_some())
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Serialize for ModelSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ModelSection", 4)?;
        state.serialize_field("provider", &self.provider)?;
        state.serialize_field("model", &self.model)?;
        // api_key and api_url are intentionally omitted.
        state.serialize_field("max_tokens", &self.max_tokens)?;
        state.serialize_field("temperature", &self.temperature)?;
        state.end()
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            provider: "claude".to_owned(),
            model: "claude-sonnet-4-20250514".to_owned(),
            api_key: None,
            api_url: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

// ---------------------------------------------------------------------------
// EngineSection
// ---------------------------------------------------------------------------

/// Engine behaviour settings mirroring `agentloom_runtime::EngineConfig`.
///
/// Kept as a parallel, independent shape rather than a shared type: this
/// crate has no dependency on `agentloom-runtime`, so a host wires
/// `EngineSection` into `EngineConfig` itself at startup (field names match
/// 1:1 so the conversion is a direct field copy).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Name of the tool treated as a user-facing message for the
    /// infinite-loop failsafe (spec §4.4 step 6).
    pub loop_failsafe_tool_name: String,
    /// Number of matching function calls since the last user action before
    /// the failsafe pauses the conversation.
    pub loop_failsafe_threshold: u32,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            loop_failsafe_tool_name: "send_message".to_owned(),
            loop_failsafe_threshold: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// or `"json"` (structured).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["agentloom_runtime=debug",
    /// "hyper=warn"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_section_debug_redacts_api_key() {
        let mut cfg = ModelSection::default();
        cfg.api_key = Some("sk-secret-12345".to_owned());
        cfg.api_url = Some("https://my-proxy.example.com".to_owned());

        let debug_str = format!("{cfg:?}");
        assert!(!debug_str.contains("sk-secret-12345"));
        assert!(!debug_str.contains("my-proxy.example.com"));
        assert!(debug_str.contains("has_api_key: true"));
    }

    #[test]
    fn model_section_serialize_omits_api_key() {
        let mut cfg = ModelSection::default();
        cfg.api_key = Some("sk-secret-12345".to_owned());

        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("sk-secret-12345"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn config_default_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.provider, config.model.provider);
        assert_eq!(
            parsed.engine.loop_failsafe_threshold,
            config.engine.loop_failsafe_threshold
        );
    }
}
