//! User settings for pipit, read from `~/.pipit/config.toml`

pub mod manager;
pub mod types;

pub use manager::{ConfigError, ConfigManager};
pub use types::{EnvironmentSettings, InstallerSettings, ManifestSettings, Settings};
