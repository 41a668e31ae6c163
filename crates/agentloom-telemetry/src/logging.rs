//! Logging setup built on `tracing-subscriber`.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{TelemetryError, TelemetryResult};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-friendly, multi-line output with source location.
    Pretty,
    /// One line per event.
    Compact,
    /// Structured JSON, one object per line.
    Json,
}

/// Where log output is written.
#[derive(Debug, Clone)]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// A daily-rotating file under the given directory.
    File {
        /// Directory the rotated log files are written into.
        directory: PathBuf,
        /// Filename prefix for rotated files.
        prefix: String,
    },
}

/// Logging configuration passed to [`setup_logging`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`).
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Per-crate/per-target directives appended to the base filter (e.g.
    /// `"agentloom_runtime=debug"`).
    pub directives: Vec<String>,
    /// Where output is written.
    pub target: LogTarget,
}

impl LogConfig {
    /// Start building a config at the given base level, writing to stdout in
    /// compact format.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Compact,
            directives: Vec::new(),
            target: LogTarget::Stdout,
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Append a per-crate tracing directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut spec = self.level.clone();
        for directive in &self.directives {
            spec.push(',');
            spec.push_str(directive);
        }
        EnvFilter::try_new(spec).map_err(|e| TelemetryError::ConfigError(e.to_string()))
    }
}

/// Install a global `tracing` subscriber built from `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::ConfigError`] if the level/directive spec is
/// malformed, or [`TelemetryError::InitError`] if a subscriber is already
/// installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;

    let set_result = match (&config.format, &config.target) {
        (LogFormat::Json, LogTarget::File { directory, prefix }) => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(appender))
                .try_init()
        },
        (LogFormat::Json, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Json, LogTarget::Stdout) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        (LogFormat::Pretty, LogTarget::File { directory, prefix }) => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(appender))
                .try_init()
        },
        (LogFormat::Pretty, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Pretty, LogTarget::Stdout) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        (LogFormat::Compact, LogTarget::File { directory, prefix }) => {
            let appender = tracing_appender::rolling::daily(directory, prefix);
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().compact().with_writer(appender))
                .try_init()
        },
        (LogFormat::Compact, LogTarget::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
        (LogFormat::Compact, LogTarget::Stdout) => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    set_result.map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install a default subscriber at `info` level, compact format, stdout.
///
/// # Errors
///
/// Returns [`TelemetryError::InitError`] if a subscriber is already
/// installed.
pub fn setup_default_logging() -> TelemetryResult<()> {
    setup_logging(&LogConfig::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_directives() {
        let config = LogConfig::new("info")
            .with_format(LogFormat::Json)
            .with_directive("agentloom_runtime=debug")
            .with_directive("hyper=warn");
        assert_eq!(config.directives.len(), 2);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn env_filter_rejects_malformed_directive() {
        let config = LogConfig::new("info").with_directive("not a valid directive!!");
        assert!(config.env_filter().is_err());
    }
}
