//! Core types for the dependency manifest

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Constraint marker meaning "any version"
pub const ANY: &str = "*";

/// Operator used when pinning to an installed version
pub const COMPATIBLE: &str = "~=";

/// One of the two independent manifest sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// `dependencies`
    Runtime,
    /// `dev-dependencies`
    Dev,
}

impl Section {
    /// Both sections, in manifest order
    pub const ALL: [Section; 2] = [Section::Runtime, Section::Dev];

    /// Key used in the manifest document
    pub fn key(self) -> &'static str {
        match self {
            Section::Runtime => "dependencies",
            Section::Dev => "dev-dependencies",
        }
    }

    /// Section selected by the `--dev` flag
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev {
            Section::Dev
        } else {
            Section::Runtime
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Structured manifest entry: `{"version": ..., "python": ..., "system": ...}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredEntry {
    /// Version constraint (defaults to [`ANY`])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Comma-separated interpreter version prefixes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,

    /// Comma-separated operating-system identifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Keys this tool does not interpret, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A manifest entry, either a bare constraint or a structured record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    /// `"requests": "~=2.0"`
    Simple(String),
    /// `"requests": {"version": "~=2.0", "system": "posix"}`
    Structured(StructuredEntry),
}

impl Entry {
    /// The resolved version constraint of this entry
    pub fn version(&self) -> &str {
        match self {
            Entry::Simple(version) => version,
            Entry::Structured(info) => info.version.as_deref().unwrap_or(ANY),
        }
    }

    /// Replace the version constraint, keeping the entry's shape
    pub fn set_version(&mut self, version: impl Into<String>) {
        match self {
            Entry::Simple(current) => *current = version.into(),
            Entry::Structured(info) => info.version = Some(version.into()),
        }
    }

    /// Whether the entry may be moved to a newer release automatically.
    ///
    /// Constraints that start with a letter point at an external source
    /// (usually a VCS locator) and are never updated. An empty constraint
    /// is not updatable either.
    pub fn is_updatable(&self) -> bool {
        is_updatable(self.version())
    }
}

/// Classify a raw constraint string, see [`Entry::is_updatable`]
pub fn is_updatable(version: &str) -> bool {
    match version.chars().next() {
        Some(first) => !first.is_alphabetic(),
        None => false,
    }
}

/// A parsed command-line package reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    /// Lowercased package name
    pub name: String,
    /// Raw constraint: empty, a VCS locator, a bare version or operator clause
    pub constraint: String,
}

impl Specifier {
    /// Create a specifier, lowercasing the name
    pub fn new(name: impl AsRef<str>, constraint: impl Into<String>) -> Self {
        Self {
            name: name.as_ref().to_lowercase(),
            constraint: constraint.into(),
        }
    }

    /// Whether the constraint should be taken from the installed version
    pub fn is_unconstrained(&self) -> bool {
        self.constraint.is_empty()
    }
}

/// Installed package versions keyed by lowercased name
pub type Installed = BTreeMap<String, String>;

/// What the current process is running on, for conditional entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    /// Interpreter version string, e.g. `3.10.1 (main, ...)`
    pub python: String,
    /// Operating-system identifier, `posix` or `nt`
    pub system: String,
}

impl Runtime {
    /// Create a runtime description
    pub fn new(python: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            python: python.into(),
            system: system.into(),
        }
    }

    /// Operating-system family identifier of this build
    pub fn current_system() -> &'static str {
        if cfg!(windows) {
            "nt"
        } else {
            "posix"
        }
    }
}
