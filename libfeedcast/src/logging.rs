//! Logging setup for the feedcast runner
//!
//! Text output for terminals and cron mail, JSON for log collectors that
//! ingest one object per line (e.g. a function runtime's log stream).
//! Everything goes to stderr.
//!
//! # Examples
//!
//! ```no_run
//! use libfeedcast::logging::{LoggingConfig, LogFormat};
//!
//! LoggingConfig::new(LogFormat::Json, "debug").init();
//!
//! // Or read FEEDCAST_LOG_FORMAT / FEEDCAST_LOG_LEVEL
//! libfeedcast::logging::init_default();
//! ```

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

pub const LOG_FORMAT_VAR: &str = "FEEDCAST_LOG_FORMAT";
pub const LOG_LEVEL_VAR: &str = "FEEDCAST_LOG_LEVEL";

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Plain text, one line per event
    #[default]
    Text,
    /// One JSON object per line
    Json,
    /// Multi-line with colors, for development
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            _ => Err(format!(
                "Invalid log format: '{}'. Valid options: text, json, pretty",
                s
            )),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Output format and level directive for the global subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `libfeedcast=debug,warn`
    pub level: String,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: impl Into<String>) -> Self {
        Self {
            format,
            level: level.into(),
        }
    }

    /// Read `FEEDCAST_LOG_FORMAT` and `FEEDCAST_LOG_LEVEL`
    ///
    /// Unset or unknown formats fall back to text, an unset or blank level to
    /// `info`.
    pub fn from_env() -> Self {
        let format = std::env::var(LOG_FORMAT_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        let level = std::env::var(LOG_LEVEL_VAR)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

        Self::new(format, level)
    }

    /// Level filter: `RUST_LOG` when set, otherwise the configured level
    ///
    /// An unparseable level falls back to `info` rather than silencing output.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }

    /// Install the global subscriber
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed
    pub fn init(&self) {
        let filter = self.filter();

        match self.format {
            LogFormat::Json => {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .flatten_event(true)
                    .with_target(true)
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::fmt()
                    .pretty()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_line_number(true)
                    .with_file(true)
                    .init();
            }
            LogFormat::Text => {
                tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .with_target(true)
                    .init();
            }
        }
    }
}

/// Initialize logging from the environment
///
/// ```bash
/// FEEDCAST_LOG_FORMAT=json FEEDCAST_LOG_LEVEL=debug feedcast-run
/// ```
pub fn init_default() {
    LoggingConfig::from_env().init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(LOG_FORMAT_VAR);
        std::env::remove_var(LOG_LEVEL_VAR);
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("Json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);

        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.contains("Invalid log format: 'xml'"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(LOG_FORMAT_VAR, "json");
        std::env::set_var(LOG_LEVEL_VAR, "warn");
        let config = LoggingConfig::from_env();
        clear_env();

        assert_eq!(config, LoggingConfig::new(LogFormat::Json, "warn"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var(LOG_FORMAT_VAR, "xml");
        std::env::set_var(LOG_LEVEL_VAR, "  ");
        let config = LoggingConfig::from_env();
        clear_env();

        assert_eq!(config.format, LogFormat::Text);
        assert_eq!(config.level, "info");
    }

    #[test]
    #[serial]
    fn test_filter_uses_configured_level() {
        clear_env();
        let filter = LoggingConfig::new(LogFormat::Text, "warn").filter();
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_level() {
        clear_env();
        std::env::set_var("RUST_LOG", "libfeedcast=trace");
        let filter = LoggingConfig::new(LogFormat::Text, "warn").filter();
        clear_env();

        assert_eq!(filter.to_string(), "libfeedcast=trace");
    }

    #[test]
    #[serial]
    fn test_invalid_level_falls_back_to_info() {
        clear_env();
        let filter = LoggingConfig::new(LogFormat::Text, "libfeedcast=loud").filter();
        assert_eq!(filter.to_string(), "info");
    }
}
