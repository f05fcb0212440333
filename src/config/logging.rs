//! Logging configuration types.
//!
//! `RUST_LOG`, when set, overrides `level` at startup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

fn default_level() -> String {
    "info".to_string()
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for log aggregation
    Json,
    /// Human-readable multi-line output
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `watermark_studio=debug` (default: info)
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), String> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| format!("logging.level '{}' is invalid: {}", self.level, e))
    }
}
