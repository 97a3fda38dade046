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
//! | `TAXI_DEBUG` | `debug` |
//! | `TAXI_LOG_LEVEL` | `log_level` |
//! | `TAXI_DATABASE_ENGINE` | `databases.default.engine` |
//! | `TAXI_DATABASE_NAME` | `databases.default.name` |
//! | `TAXI_PASSWORD_MIN_LENGTH` | `password_min_length` |

use std::path::Path;

use crate::error::TaxiError;
use crate::settings::Settings;

/// Loads settings from a TOML string, keeping defaults for missing keys.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, TaxiError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| TaxiError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a JSON string, keeping defaults for missing keys.
pub fn from_json_str(json_str: &str) -> Result<Settings, TaxiError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| TaxiError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a file, picking the format from its extension.
///
/// `.json` files are parsed as JSON; anything else as TOML.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, TaxiError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        TaxiError::ConfigurationError(format!(
            "Failed to read settings file '{}': {e}",
            path.display()
        ))
    })?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => from_json_str(&content),
        _ => from_toml_str(&content),
    }
}

/// Loads settings from a file and then applies environment overrides.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, TaxiError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Result<Settings, TaxiError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `TAXI_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), TaxiError> {
    apply_overrides(settings, |key| std::env::var(key).ok())
}

/// Applies overrides from an arbitrary lookup (the environment in production).
fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), TaxiError> {
    if let Some(val) = lookup("TAXI_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("TAXI_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("TAXI_DATABASE_ENGINE") {
        settings
            .databases
            .entry("default".to_string())
            .or_default()
            .engine = val;
    }

    if let Some(val) = lookup("TAXI_DATABASE_NAME") {
        settings
            .databases
            .entry("default".to_string())
            .or_default()
            .name = val;
    }

    if let Some(val) = lookup("TAXI_PASSWORD_MIN_LENGTH") {
        settings.password_min_length = val.parse::<usize>().map_err(|e| {
            TaxiError::ConfigurationError(format!("TAXI_PASSWORD_MIN_LENGTH '{val}': {e}"))
        })?;
    }

    Ok(())
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, TaxiError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        TaxiError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        TaxiError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
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
