//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Maximum allowed `max_tokens` value (16 million).
const MAX_TOKENS_CEILING: usize = 16_000_000;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_model(config)?;
    validate_engine(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_model(config: &Config) -> ConfigResult<()> {
    if config.model.max_tokens == 0 || config.model.max_tokens > MAX_TOKENS_CEILING {
        return Err(ConfigError::ValidationError {
            field: "model.max_tokens".to_owned(),
            message: format!(
                "must be between 1 and {MAX_TOKENS_CEILING}, got {}",
                config.model.max_tokens
            ),
        });
    }
    if !(0.0..=2.0).contains(&config.model.temperature) {
        return Err(ConfigError::ValidationError {
            field: "model.temperature".to_owned(),
            message: format!("must be between 0.0 and 2.0, got {}", config.model.temperature),
        });
    }
    Ok(())
}

fn validate_engine(config: &Config) -> ConfigResult<()> {
    if config.engine.loop_failsafe_threshold == 0 {
        return Err(ConfigError::ValidationError {
            field: "engine.loop_failsafe_threshold".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }
    if config.engine.loop_failsafe_tool_name.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "engine.loop_failsafe_tool_name".to_owned(),
            message: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    if !VALID_LOG_LEVELS.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "must be one of {VALID_LOG_LEVELS:?}, got {:?}",
                config.logging.level
            ),
        });
    }
    if !VALID_LOG_FORMATS.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "must be one of {VALID_LOG_FORMATS:?}, got {:?}",
                config.logging.format
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        let mut config = Config::default();
        config.model.max_tokens = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn zero_failsafe_threshold_is_rejected() {
        let mut config = Config::default();
        config.engine.loop_failsafe_threshold = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert!(validate(&config).is_err());
    }
}
