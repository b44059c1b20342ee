//! User configuration file handling
//!
//! Manages settings from ~/.config/mfvec/settings.json

use super::settings::Settings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// User configuration from ~/.config/mfvec/settings.json
///
/// These settings override built-in defaults but are overridden by CLI arguments
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub settings: Settings,
}

impl ConfigFile {
    /// Get the path to the mfvec config directory
    pub fn config_dir() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("mfvec")
    }

    /// Get the path to the user config file
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Load configuration from the user config file
    pub fn load() -> Option<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, `None` if it is missing or broken
    pub fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    debug!("Loaded settings from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    warn!("Failed to parse {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                None
            }
        }
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Initialize the user configuration directory
    ///
    /// This creates:
    /// 1. The ~/.config/mfvec directory with its logs/ directory
    /// 2. A settings.json file with default values
    pub fn initialize_config_directory() -> anyhow::Result<()> {
        let config_dir = Self::config_dir();
        fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {:?}", config_dir);

        let logs_dir = config_dir.join("logs");
        fs::create_dir_all(&logs_dir)?;
        println!("Created logs directory: {:?}", logs_dir);

        let settings_path = Self::config_path();
        if !settings_path.exists() {
            ConfigFile::default().save()?;
            println!("Created settings file: {:?}", settings_path);
        } else {
            println!("Settings file already exists: {:?}", settings_path);
        }

        println!("\nConfiguration initialized successfully!");
        println!("  - Edit settings at: {:?}", settings_path);
        println!("  - View logs in: {:?}", logs_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut config = ConfigFile::default();
        config.settings.kerning_classes = true;
        config.settings.upm = Some(1000);
        config.save_to(&path).unwrap();

        assert_eq!(ConfigFile::load_from(&path), Some(config));
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(ConfigFile::load_from(&dir.path().join("absent.json")), None);
    }

    #[test]
    fn test_broken_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ConfigFile::load_from(&path), None);
    }
}
