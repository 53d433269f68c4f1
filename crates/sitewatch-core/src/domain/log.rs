//! Build log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Level of a build log line.
///
/// Unrecognised levels are read as `Info`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    #[serde(alias = "warning")]
    Warn,
    Error,
    #[serde(other)]
    Info,
}

/// One line of build output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    #[serde(alias = "ts")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "default_level")]
    pub level: LogLevel,

    #[serde(alias = "text")]
    pub message: String,

    /// Build phase that produced the line (e.g. "install", "build").
    #[serde(default)]
    pub source: String,
}

fn default_level() -> LogLevel {
    LogLevel::Info
}

impl LogLine {
    pub fn new(timestamp: DateTime<Utc>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            level,
            message: message.into(),
            source: String::new(),
        }
    }

    /// Set the source tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}
