//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `GAEFORMS_DEBUG` | `debug` |
//! | `GAEFORMS_LOG_LEVEL` | `log_level` |
//! | `GAEFORMS_STRING_MAX_LENGTH` | `forms.string_max_length` |
//! | `GAEFORMS_DATE_FORMAT` | `forms.date_format` |
//! | `GAEFORMS_DATETIME_FORMAT` | `forms.datetime_format` |
//! | `GAEFORMS_TIME_FORMAT` | `forms.time_format` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use gaeforms_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/gaeforms.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::GaeError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Keys not present in the TOML keep their default values, including keys
/// nested inside the `[forms]` table.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, GaeError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| GaeError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, GaeError> {
    let content = read_config(path.as_ref())?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, GaeError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, GaeError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| GaeError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, GaeError> {
    let content = read_config(path.as_ref())?;
    from_json_str(&content)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `GAEFORMS_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("GAEFORMS_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("GAEFORMS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("GAEFORMS_STRING_MAX_LENGTH") {
        if let Ok(max) = val.parse::<usize>() {
            settings.forms.string_max_length = max;
        }
    }

    if let Some(val) = lookup("GAEFORMS_DATE_FORMAT") {
        settings.forms.date_format = val;
    }

    if let Some(val) = lookup("GAEFORMS_DATETIME_FORMAT") {
        settings.forms.datetime_format = val;
    }

    if let Some(val) = lookup("GAEFORMS_TIME_FORMAT") {
        settings.forms.time_format = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path) -> Result<String, GaeError> {
    Ok(std::fs::read_to_string(path)?)
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, GaeError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        GaeError::SerializationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        GaeError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
