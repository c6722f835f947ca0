use crate::types::Settings;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Manager for pipit settings
///
/// Settings are stored in ~/.pipit/config.toml. Every field is optional.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Get the default config path (~/.pipit/config.toml)
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".pipit").join("config.toml"))
    }

    /// Load settings from a specific path, which must exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::ConfigNotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        let settings: Settings = toml::from_str(&contents)?;

        debug!(path = %path.display(), "loaded settings");
        Ok(Self {
            config_path: path.to_path_buf(),
            settings,
        })
    }

    /// Load settings from `path`, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load_from(path) {
            Err(ConfigError::ConfigNotFound(_)) => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self {
                    config_path: path.to_path_buf(),
                    settings: Settings::default(),
                })
            }
            other => other,
        }
    }

    /// Load settings from an explicit path, or from the default location
    ///
    /// An explicit path must exist; the default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load_or_default(&Self::default_path()?),
        }
    }

    /// Path the settings were read from, or would be read from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get reference to settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
