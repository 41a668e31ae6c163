//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Start from `Config::default()`.
//! 2. Merge `/etc/agentloom/config.toml` (system), if present.
//! 3. Merge `~/.agentloom/config.toml` (user), if present.
//! 4. Merge `{workspace}/.agentloom/config.toml` (workspace), if present.
//! 5. Deserialize the merged tree into a [`Config`].
//! 6. Validate.
//!
//! Unlike a host that must let an untrusted workspace config *tighten but
//! never loosen* a security policy, this crate carries no security-policy
//! section (capability tokens, path/host allowlists, audit signing all have
//! no counterpart here — see `DESIGN.md`), so there is nothing for a
//! workspace layer to illegitimately loosen. Each layer simply wins outright
//! over the ones before it.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::merge::deep_merge;
use crate::types::Config;
use crate::validate;

/// Maximum allowed config file size (1 MB), guarding against an oversized
/// file being read into memory in full.
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load the unified configuration with layered file precedence.
///
/// `workspace_root` is the root of the current project (e.g. the repo root
/// or `cwd`). If `None`, the workspace layer is skipped.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, or if the
/// final merged configuration fails validation.
pub fn load(workspace_root: Option<&Path>) -> ConfigResult<Config> {
    let mut merged = toml::Value::try_from(Config::default())
        .expect("Config::default() always serializes to a TOML table");

    let system_path = PathBuf::from("/etc/agentloom/config.toml");
    if let Some(overlay) = try_load_file(&system_path)? {
        deep_merge(&mut merged, &overlay);
        info!(path = %system_path.display(), "loaded system config");
    }

    if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
        let user_path = home.join(".agentloom").join("config.toml");
        if let Some(overlay) = try_load_file(&user_path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %user_path.display(), "loaded user config");
        }
    }

    if let Some(ws_root) = workspace_root {
        let ws_path = ws_root.join(".agentloom").join("config.toml");
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %ws_path.display(), "loaded workspace config");
        }
    }

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Load a config from a specific file path (no layering, no defaults merge).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
///
/// Uses a single read operation to avoid TOCTOU races (no separate
/// exists/metadata checks before reading).
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_without_any_files_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(dir.path())).unwrap();
        assert_eq!(config.model.provider, "claude");
        assert_eq!(config.engine.loop_failsafe_threshold, 10);
    }

    #[test]
    fn workspace_layer_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ws_dir = dir.path().join(".agentloom");
        std::fs::create_dir_all(&ws_dir).unwrap();
        std::fs::write(
            ws_dir.join("config.toml"),
            "[engine]\nloop_failsafe_threshold = 25\n",
        )
        .unwrap();

        let config = load(Some(dir.path())).unwrap();
        assert_eq!(config.engine.loop_failsafe_threshold, 25);
        // Untouched fields keep their default.
        assert_eq!(config.engine.loop_failsafe_tool_name, "send_message");
    }

    #[test]
    fn load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn try_load_file_missing() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
