//! Logging configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::Level;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Log severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn as_tracing_level(&self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Raise verbosity by `steps` levels, saturating at trace
    pub fn raised_by(self, steps: u8) -> Self {
        let mut level = self;
        for _ in 0..steps {
            level = match level {
                Self::Error => Self::Warn,
                Self::Warn => Self::Info,
                Self::Info => Self::Debug,
                Self::Debug | Self::Trace => Self::Trace,
            };
        }
        level
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: LogLevel::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raised_by_saturates() {
        assert_eq!(LogLevel::Info.raised_by(0), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised_by(1), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised_by(9), LogLevel::Trace);
    }

    #[test]
    fn test_tracing_level() {
        assert_eq!(LogLevel::Error.as_tracing_level(), Level::ERROR);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
