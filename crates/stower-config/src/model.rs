//! Typed settings models.
//!
//! # Design
//! - Pure data carriers; loading and validation live in sibling modules.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Fully resolved service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Friendly identifier recorded in logs.
    pub instance_name: String,
    /// IP address (and interface) the API server binds to.
    pub bind_addr: IpAddr,
    /// HTTP port the API server binds to.
    pub http_port: u16,
    /// Staging root that finished payloads are read from.
    pub source_root: PathBuf,
    /// Library root that finished payloads are copied into.
    pub library_root: PathBuf,
    /// Number of copy jobs the queue holds before shedding load.
    pub queue_capacity: usize,
    /// Logging configuration.
    pub log: LogSettings,
}

impl Settings {
    /// Socket address the API listener should bind to.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            instance_name: defaults::DEFAULT_INSTANCE_NAME.to_string(),
            bind_addr: defaults::DEFAULT_BIND_ADDR,
            http_port: defaults::DEFAULT_HTTP_PORT,
            source_root: PathBuf::from(defaults::DEFAULT_SOURCE_ROOT),
            library_root: PathBuf::from(defaults::DEFAULT_LIBRARY_ROOT),
            queue_capacity: defaults::DEFAULT_QUEUE_CAPACITY,
            log: LogSettings::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogSettings {
    /// Log level string (e.g. `info`, `debug`) used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormatSetting,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormatSetting::Auto,
        }
    }
}

/// Requested logger output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Infer from the build profile.
    #[default]
    Auto,
    /// Structured JSON objects.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatSetting {
    pub(crate) fn from_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}
