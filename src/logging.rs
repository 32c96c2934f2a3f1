//! Logging setup for the command-line runner.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to binaries. Logs go to stderr so trace output on stdout stays clean.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Environment variable consulted when no level is given explicitly
pub const LOG_ENV: &str = "EMX_GHERKIN_LOG";

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Read the level from [`LOG_ENV`], falling back to the default.
    pub fn from_env() -> Result<Self, String> {
        match std::env::var(LOG_ENV) {
            Ok(val) => val.parse(),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown log level '{}', expected one of: trace, debug, info, warn, error",
                s
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// Install a stderr subscriber at `level`.
///
/// A second call is a no-op; the first subscriber wins.
pub fn init_logging(level: LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.as_filter_str()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().unwrap_err().contains("unknown log level"));
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(LogLevel::Error);
        init_logging(LogLevel::Trace);
    }
}
