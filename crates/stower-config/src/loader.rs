//! Settings sources.
//!
//! Compiled defaults are overlaid with an optional JSON settings file named
//! by `STOWER_CONFIG`, then with individual `STOWER_*` environment
//! variables. The merged result is validated before it is handed out.

use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LogFormatSetting, Settings};
use crate::validate;

const ENV_CONFIG: &str = "STOWER_CONFIG";
const ENV_INSTANCE_NAME: &str = "STOWER_INSTANCE_NAME";
const ENV_BIND_ADDR: &str = "STOWER_BIND_ADDR";
const ENV_HTTP_PORT: &str = "STOWER_HTTP_PORT";
const ENV_SOURCE_ROOT: &str = "STOWER_SOURCE_ROOT";
const ENV_LIBRARY_ROOT: &str = "STOWER_LIBRARY_ROOT";
const ENV_QUEUE_CAPACITY: &str = "STOWER_QUEUE_CAPACITY";
const ENV_LOG_LEVEL: &str = "STOWER_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "STOWER_LOG_FORMAT";

/// Optional fields accepted from a JSON settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    instance_name: Option<String>,
    bind_addr: Option<IpAddr>,
    http_port: Option<u16>,
    source_root: Option<PathBuf>,
    library_root: Option<PathBuf>,
    queue_capacity: Option<usize>,
    log_level: Option<String>,
    log_format: Option<LogFormatSetting>,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed, if an
    /// environment override carries an unparsable value, or if the merged
    /// settings fail validation.
    pub fn load() -> ConfigResult<Self> {
        load_with(&|name| env::var(name).ok())
    }
}

pub(crate) fn load_with(lookup: &dyn Fn(&str) -> Option<String>) -> ConfigResult<Settings> {
    let mut settings = Settings::default();
    if let Some(path) = lookup(ENV_CONFIG) {
        apply_file(&mut settings, Path::new(&path))?;
    }
    apply_env(&mut settings, lookup)?;
    validate::validate(&settings)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path) -> ConfigResult<()> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::io("settings_file.read", path, source))?;
    let file: SettingsFile =
        serde_json::from_str(&raw).map_err(|source| ConfigError::parse(path, source))?;

    if let Some(instance_name) = file.instance_name {
        settings.instance_name = instance_name;
    }
    if let Some(bind_addr) = file.bind_addr {
        settings.bind_addr = bind_addr;
    }
    if let Some(http_port) = file.http_port {
        settings.http_port = http_port;
    }
    if let Some(source_root) = file.source_root {
        settings.source_root = source_root;
    }
    if let Some(library_root) = file.library_root {
        settings.library_root = library_root;
    }
    if let Some(queue_capacity) = file.queue_capacity {
        settings.queue_capacity = queue_capacity;
    }
    if let Some(log_level) = file.log_level {
        settings.log.level = log_level;
    }
    if let Some(log_format) = file.log_format {
        settings.log.format = log_format;
    }

    info!(path = %path.display(), "settings file applied");
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> ConfigResult<()> {
    if let Some(value) = lookup(ENV_INSTANCE_NAME) {
        settings.instance_name = value;
    }
    if let Some(value) = lookup(ENV_BIND_ADDR) {
        settings.bind_addr = value.parse::<IpAddr>().map_err(|_| {
            ConfigError::invalid("env", "bind_addr", Some(value), "invalid_ip_addr")
        })?;
    }
    if let Some(value) = lookup(ENV_HTTP_PORT) {
        settings.http_port = value
            .parse::<u16>()
            .map_err(|_| ConfigError::invalid("env", "http_port", Some(value), "invalid_port"))?;
    }
    if let Some(value) = lookup(ENV_SOURCE_ROOT) {
        settings.source_root = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_LIBRARY_ROOT) {
        settings.library_root = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_QUEUE_CAPACITY) {
        settings.queue_capacity = value.parse::<usize>().map_err(|_| {
            ConfigError::invalid("env", "queue_capacity", Some(value), "invalid_capacity")
        })?;
    }
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        settings.log.level = value;
    }
    if let Some(value) = lookup(ENV_LOG_FORMAT) {
        settings.log.format = LogFormatSetting::from_value(&value).ok_or(
            ConfigError::InvalidField {
                section: "env",
                field: "log_format",
                value: Some(value),
                reason: "unknown_format",
            },
        )?;
    }
    Ok(())
}
