//! The `pipit.json` manifest: document model and file store

use crate::types::{Entry, Section};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "pipit.json";

/// Entries of one section, keyed by lowercased package name
pub type Entries = BTreeMap<String, Entry>;

/// The manifest document.
///
/// Top-level keys other than the two sections are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dependencies: Entries,

    #[serde(
        default,
        rename = "dev-dependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    dev_dependencies: Entries,

    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl Manifest {
    /// Parse a manifest document and lowercase its package names
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(content)?;
        manifest.normalize();
        Ok(manifest)
    }

    /// Serialize with sorted keys, 2-space indentation and a trailing newline.
    ///
    /// Empty sections are omitted.
    pub fn to_json(&self) -> serde_json::Result<String> {
        // Going through `Value` sorts the flattened extra keys in with the sections
        let value = serde_json::to_value(self)?;
        let mut out = serde_json::to_string_pretty(&value)?;
        out.push('\n');
        Ok(out)
    }

    /// Lowercase every package name in both sections.
    ///
    /// If two names collide after lowercasing, the one that sorts last wins.
    pub fn normalize(&mut self) {
        for section in Section::ALL {
            let entries = std::mem::take(self.section_mut(section));
            *self.section_mut(section) = entries
                .into_iter()
                .map(|(name, entry)| (name.to_lowercase(), entry))
                .collect();
        }
    }

    /// Entries of a section
    pub fn section(&self, section: Section) -> &Entries {
        match section {
            Section::Runtime => &self.dependencies,
            Section::Dev => &self.dev_dependencies,
        }
    }

    /// Mutable entries of a section
    pub fn section_mut(&mut self, section: Section) -> &mut Entries {
        match section {
            Section::Runtime => &mut self.dependencies,
            Section::Dev => &mut self.dev_dependencies,
        }
    }

    /// Look up a package in a section
    pub fn get(&self, section: Section, name: &str) -> Option<&Entry> {
        self.section(section).get(name)
    }

    /// Record a constraint for `name` in `section`.
    ///
    /// An existing structured entry keeps its other fields and only has its
    /// version replaced; anything else is stored as a simple string.
    pub fn upsert(&mut self, section: Section, name: &str, version: impl Into<String>) {
        let entries = self.section_mut(section);
        match entries.get_mut(name) {
            Some(entry @ Entry::Structured(_)) => entry.set_version(version),
            _ => {
                entries.insert(name.to_string(), Entry::Simple(version.into()));
            }
        }
    }

    /// Replace the version of `name` in every section that lists it.
    ///
    /// Returns whether any section contained the package.
    pub fn repin(&mut self, name: &str, version: &str) -> bool {
        let mut found = false;
        for section in Section::ALL {
            if let Some(entry) = self.section_mut(section).get_mut(name) {
                entry.set_version(version);
                found = true;
            }
        }
        found
    }

    /// Remove `name` from both sections; returns whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let runtime = self.dependencies.remove(name).is_some();
        let dev = self.dev_dependencies.remove(name).is_some();
        runtime || dev
    }

    /// Names in either section whose constraint is not externally tracked
    pub fn updatable(&self) -> BTreeSet<String> {
        Section::ALL
            .iter()
            .flat_map(|section| self.section(*section))
            .filter(|(_, entry)| entry.is_updatable())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether both sections are empty
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.dev_dependencies.is_empty()
    }
}

/// Reads and writes the manifest file of a project directory
#[derive(Debug, Clone)]
pub struct ManifestStore {
    root: PathBuf,
    file_name: String,
}

impl ManifestStore {
    /// Create a store rooted at the project directory
    pub fn new(root: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            file_name: file_name.into(),
        }
    }

    /// Project directory the store reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the manifest file
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    /// Write an empty manifest into `base` unless one already exists.
    ///
    /// A relative `base` is resolved against the store root. Returns whether
    /// a file was written.
    pub fn create(&self, base: &Path) -> Result<bool> {
        let path = self.root.join(base).join(&self.file_name);
        if path.exists() {
            return Ok(false);
        }

        debug!(path = %path.display(), "creating empty manifest");
        write_atomic(&path, "{}\n")?;
        Ok(true)
    }

    /// Load the manifest from the project directory
    ///
    /// # Errors
    /// - [`Error::ManifestNotFound`] if the file does not exist
    /// - [`Error::ManifestMalformed`] if it is not a valid document
    pub fn load(&self) -> Result<Manifest> {
        let path = self.path();
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::ManifestNotFound(path.clone()),
            _ => Error::Environment(e),
        })?;

        Manifest::from_json(&content).map_err(|e| Error::malformed(&path, e.to_string()))
    }

    /// Persist the whole manifest in one write
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let path = self.path();
        let content = manifest
            .to_json()
            .map_err(|e| Error::unknown(format!("failed to serialize manifest: {e}")))?;

        debug!(path = %path.display(), "writing manifest");
        write_atomic(&path, &content)
    }
}

/// Write to a sibling temporary file, then rename over the target
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|ext| ext.to_str()).unwrap_or("")
    ));

    std::fs::write(&temp_path, contents)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
