//! Settings for taxi-rs.
//!
//! [`Settings`] holds the whole application configuration with sensible
//! defaults. Use [`settings_loader`](crate::settings_loader) to read it from
//! a file and the environment.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The engine name for the SQLite backend.
pub const ENGINE_SQLITE: &str = "sqlite";

/// The engine name for the in-process memory store.
pub const ENGINE_MEMORY: &str = "memory";

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The storage engine: `"sqlite"` or `"memory"`.
    pub engine: String,
    /// The database file path (`:memory:` for a throwaway SQLite database).
    pub name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: ENGINE_SQLITE.to_string(),
            name: "taxi.sqlite3".to_string(),
        }
    }
}

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use taxi_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.password_min_length, 8);
/// assert_eq!(settings.default_database().engine, "sqlite");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log filter directive (e.g. "info", "taxi=debug").
    pub log_level: String,
    /// Database configurations, keyed by alias (e.g. "default").
    pub databases: HashMap<String, DatabaseSettings>,
    /// Minimum accepted password length for new accounts.
    pub password_min_length: usize,
    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert("default".to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            log_level: "info".to_string(),
            databases,
            password_min_length: 8,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the `default` database alias, falling back to the built-in default.
    pub fn default_database(&self) -> DatabaseSettings {
        self.databases.get("default").cloned().unwrap_or_default()
    }
}
