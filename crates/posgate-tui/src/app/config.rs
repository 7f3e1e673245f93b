//! TUI configuration persistence
//!
//! Loads and saves the gate settings, the optional identity backend and
//! display preferences.

use std::fs;
use std::path::{Path, PathBuf};

use posgate_core::{FirebaseConfig, GateConfig};
use serde::{Deserialize, Serialize};

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

/// Configuration directory under ~/.config
const CONFIG_DIR_NAME: &str = "posgate";

/// TUI configuration that persists across sessions
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TuiConfig {
    /// Verification server, timings and messages
    #[serde(default)]
    pub gate: GateConfig,

    /// Identity backend; anonymous sign-in is skipped when absent
    #[serde(default)]
    pub firebase: Option<FirebaseConfig>,

    /// Use the high-contrast palette
    #[serde(default)]
    pub high_contrast: bool,
}

impl TuiConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        // Try XDG_CONFIG_HOME first, then fall back to ~/.config
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config).join(CONFIG_DIR_NAME);
            return Some(path);
        }

        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME))
    }

    /// Get the full config file path
    pub fn config_file_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location
    ///
    /// Returns default configuration if file doesn't exist or can't be parsed.
    pub fn load() -> Self {
        match Self::config_file_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, with the same fallbacks as
    /// [`TuiConfig::load`]
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::warn!("Config file {:?} not found, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_file = Self::config_file_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&config_file)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| ConfigError::Io(e.to_string()))?;
            }
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, contents).map_err(|e| ConfigError::Io(e.to_string()))?;

        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TuiConfig::default();
        assert_eq!(config.gate, GateConfig::default());
        assert!(config.firebase.is_none());
        assert!(!config.high_contrast);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = TuiConfig::default();
        config.gate.server_url = "http://caja.local:5000".to_string();
        config.high_contrast = true;
        config.save_to(&path).unwrap();

        let loaded = TuiConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_to_default_location() {
        let dir = tempfile::tempdir().unwrap();
        let previous = std::env::var_os("XDG_CONFIG_HOME");
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let mut config = TuiConfig::default();
        config.gate.protected_route = "/caja".to_string();
        let saved = config.save();
        let path = TuiConfig::config_file_path();
        let loaded = TuiConfig::load();

        match previous {
            Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        saved.unwrap();
        assert_eq!(
            path,
            Some(dir.path().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        );
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = TuiConfig::load_from(&dir.path().join("absent.json"));
        assert_eq!(loaded, TuiConfig::default());
    }

    #[test]
    fn test_unparsable_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(TuiConfig::load_from(&path), TuiConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{
                "gate": { "server_url": "https://pos.example" },
                "firebase": { "apiKey": "k", "projectId": "lindero" }
            }"#,
        )
        .unwrap();

        let loaded = TuiConfig::load_from(&path);
        assert_eq!(loaded.gate.server_url, "https://pos.example");
        assert_eq!(loaded.gate.min_loading_ms, GateConfig::default().min_loading_ms);
        let firebase = loaded.firebase.unwrap();
        assert_eq!(firebase.api_key, "k");
        assert_eq!(firebase.project_id, "lindero");
    }
}
