//! Startup validation for merged settings.

use crate::error::{ConfigError, ConfigResult};
use crate::model::Settings;

pub(crate) fn validate(settings: &Settings) -> ConfigResult<()> {
    if settings.http_port == 0 {
        return Err(ConfigError::invalid(
            "http",
            "port",
            Some(settings.http_port.to_string()),
            "zero",
        ));
    }

    if settings.queue_capacity == 0 {
        return Err(ConfigError::invalid(
            "queue",
            "capacity",
            Some(settings.queue_capacity.to_string()),
            "zero",
        ));
    }

    if settings.instance_name.trim().is_empty() {
        return Err(ConfigError::invalid("app", "instance_name", None, "empty"));
    }

    if settings.log.level.trim().is_empty() {
        return Err(ConfigError::invalid("log", "level", None, "empty"));
    }

    if !settings.source_root.is_absolute() {
        return Err(ConfigError::invalid(
            "paths",
            "source_root",
            Some(settings.source_root.display().to_string()),
            "not_absolute",
        ));
    }

    if !settings.library_root.is_absolute() {
        return Err(ConfigError::invalid(
            "paths",
            "library_root",
            Some(settings.library_root.display().to_string()),
            "not_absolute",
        ));
    }

    // Overlapping roots would let a copy read its own output.
    if settings.library_root.starts_with(&settings.source_root)
        || settings.source_root.starts_with(&settings.library_root)
    {
        return Err(ConfigError::invalid(
            "paths",
            "library_root",
            Some(settings.library_root.display().to_string()),
            "overlaps_source_root",
        ));
    }

    Ok(())
}
