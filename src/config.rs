//! Application settings and user preferences.
//!
//! Settings live in `~/.config/keycut/config.json`. Every field has a
//! default, and any load failure (missing file, bad JSON) degrades to the
//! defaults with a warning - configuration problems are never fatal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Default tracker poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default combos for the fixed system shortcuts.
pub const DEFAULT_TOGGLE_WINDOW_COMBO: &str = "ctrl+alt+h";
pub const DEFAULT_SAVE_ALL_COMBO: &str = "ctrl+alt+s";
pub const DEFAULT_OPEN_SEARCH_COMBO: &str = "alt+r";

/// Combos for the fixed, OS-bound system shortcuts.
///
/// Only these three are ever registered with the OS; user-defined hotkeys
/// are reachable through the search popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    #[serde(default = "default_toggle_window")]
    pub toggle_window: String,
    #[serde(default = "default_save_all")]
    pub save_all: String,
    #[serde(default = "default_open_search")]
    pub open_search: String,
}

fn default_toggle_window() -> String {
    DEFAULT_TOGGLE_WINDOW_COMBO.to_string()
}

fn default_save_all() -> String {
    DEFAULT_SAVE_ALL_COMBO.to_string()
}

fn default_open_search() -> String {
    DEFAULT_OPEN_SEARCH_COMBO.to_string()
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            toggle_window: default_toggle_window(),
            save_all: default_save_all(),
            open_search: default_open_search(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tracker poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Data directory override. Defaults to `~/.config/keycut`.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub shortcuts: ShortcutConfig,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            data_dir: None,
            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl Config {
    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => default_data_dir(),
        }
    }

    /// Path of the persisted hotkey collection.
    pub fn hotkeys_path(&self) -> PathBuf {
        self.data_dir().join("hotkeys.json")
    }

    /// Path of the auxiliary token file.
    pub fn token_path(&self) -> PathBuf {
        self.data_dir().join("data.json")
    }
}

/// Default data directory (`~/.config/keycut`).
pub fn default_data_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.config/keycut").as_ref())
}

/// Default config file path (`~/.config/keycut/config.json`).
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.json")
}

/// Load configuration from the given path.
///
/// Returns `Config::default()` if the file is missing or unparsable.
#[instrument(name = "load_config")]
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config");
            config
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse config JSON, using defaults");
            Config::default()
        }
    }
}
