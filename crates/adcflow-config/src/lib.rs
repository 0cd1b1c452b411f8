pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::PathBuf;

/// Find the settings file.
///
/// Search order:
/// 1. ADCFLOW_CONFIG environment variable (direct path)
/// 2. ./adcflow.yaml
/// 3. ~/.config/adcflow/config.yaml
pub fn find_settings_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("ADCFLOW_CONFIG") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let local = std::env::current_dir()?.join("adcflow.yaml");
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("adcflow").join("config.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

impl Settings {
    /// Load settings from the first file found by [`find_settings_file`].
    pub fn load() -> Result<Self> {
        Self::load_from(&find_settings_file()?)
    }

    /// Load settings from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}
