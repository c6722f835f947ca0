use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main settings structure for pipit
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// How environments are created
    pub environment: EnvironmentSettings,

    /// Where the manifest lives
    pub manifest: ManifestSettings,

    /// Which installer to drive
    pub installer: InstallerSettings,
}

/// Environment creation settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentSettings {
    /// Directory name of the environment, relative to the project
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Program that creates environments
    #[serde(default = "default_creator")]
    pub creator: String,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            creator: default_creator(),
        }
    }
}

/// Manifest location settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestSettings {
    /// Manifest file name inside the project directory
    #[serde(default = "default_manifest_file")]
    pub file: String,
}

impl Default for ManifestSettings {
    fn default() -> Self {
        Self {
            file: default_manifest_file(),
        }
    }
}

/// Installer settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InstallerSettings {
    /// Use this installer instead of the one inside the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<PathBuf>,
}

// Default value functions
fn default_directory() -> String {
    ".pipit".to_string()
}

fn default_creator() -> String {
    "virtualenv".to_string()
}

fn default_manifest_file() -> String {
    "pipit.json".to_string()
}
