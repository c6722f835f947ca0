//! Workflows that keep the manifest and the environment in step
//!
//! Every workflow is one linear sequence. External state changes first and
//! the manifest is written last, so a failed installer call never leaves a
//! manifest that claims something the environment does not have.

use crate::condition::is_applicable;
use crate::installer::{Installer, Provisioner};
use crate::manifest::ManifestStore;
use crate::specifier::{render, ParsedArgs};
use crate::types::{Entry, Installed, Runtime, Section, COMPATIBLE};
use crate::{Error, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Default environment directory name
pub const ENV_DIR: &str = ".pipit";

/// What a workflow did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Arguments handed to the installer, empty if it was not invoked
    pub installer_args: Vec<String>,
    /// Whether the manifest file was written
    pub manifest_written: bool,
}

/// Drives the `new`, `install`, `uninstall`, `update`, `list` and `outdated` workflows
pub struct Reconciler<'a, I, P> {
    installer: &'a I,
    provisioner: &'a P,
    store: ManifestStore,
    env_dir: String,
    system: String,
}

impl<'a, I: Installer, P: Provisioner> Reconciler<'a, I, P> {
    /// Create a reconciler for the project the store points at
    pub fn new(installer: &'a I, provisioner: &'a P, store: ManifestStore) -> Self {
        Self {
            installer,
            provisioner,
            store,
            env_dir: ENV_DIR.to_string(),
            system: Runtime::current_system().to_string(),
        }
    }

    /// Use a different environment directory name
    pub fn with_env_dir(mut self, env_dir: impl Into<String>) -> Self {
        self.env_dir = env_dir.into();
        self
    }

    /// Evaluate `system` conditions against a different identifier
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    /// The manifest store in use
    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Make sure `path` has an environment and a manifest.
    ///
    /// Both steps are skipped when their target already exists.
    pub fn new_environment(&self, path: Option<&Path>, interpreter: Option<&str>) -> Result<Outcome> {
        let base = path.unwrap_or_else(|| Path::new(""));
        let env_path = self.store.root().join(base).join(&self.env_dir);

        if !self.provisioner.exists(&env_path) {
            info!(path = %env_path.display(), "creating environment");
            self.provisioner.create(&env_path, interpreter)?;
        } else {
            debug!(path = %env_path.display(), "environment already exists");
        }

        let manifest_written = self.store.create(base)?;
        Ok(Outcome {
            installer_args: Vec::new(),
            manifest_written,
        })
    }

    /// Install named packages and record them, or install everything the
    /// manifest lists when no packages are named.
    pub fn install<S: AsRef<str>>(&self, packages: &[S], dev: bool) -> Result<Outcome> {
        let args = ParsedArgs::parse(packages)?;
        self.new_environment(None, None)?;

        if args.is_empty() {
            self.install_manifest(dev)
        } else {
            self.install_packages(&args, Section::from_dev_flag(dev))
        }
    }

    fn install_packages(&self, args: &ParsedArgs, section: Section) -> Result<Outcome> {
        let mut manifest = self.store.load()?;

        self.installer.install(&args.raw)?;
        let installed = self.installer.installed()?;

        for spec in &args.specifiers {
            let version = if spec.is_unconstrained() {
                pin(&installed, &spec.name)?
            } else {
                spec.constraint.clone()
            };
            debug!(package = %spec.name, %version, %section, "recording dependency");
            manifest.upsert(section, &spec.name, version);
        }

        self.store.save(&manifest)?;
        info!(count = args.specifiers.len(), %section, "installed packages");

        Ok(Outcome {
            installer_args: args.raw.clone(),
            manifest_written: true,
        })
    }

    fn install_manifest(&self, dev: bool) -> Result<Outcome> {
        let manifest = self.store.load()?;

        let sections: &[Section] = if dev {
            &Section::ALL
        } else {
            &[Section::Runtime]
        };
        let entries: Vec<(&String, &Entry)> = sections
            .iter()
            .flat_map(|section| manifest.section(*section))
            .collect();

        // Only ask the environment for its interpreter when something depends on it
        let needs_interpreter = entries
            .iter()
            .any(|(_, entry)| matches!(entry, Entry::Structured(info) if info.python.is_some()));
        let python = if needs_interpreter {
            self.installer.interpreter_version()?
        } else {
            String::new()
        };
        let runtime = Runtime::new(python, self.system.clone());

        let mut specifiers = Vec::new();
        for (name, entry) in entries {
            if !is_applicable(entry, &runtime) {
                debug!(package = %name, "skipping, conditions do not match this environment");
                continue;
            }
            let rendered = render(name, entry.version())
                .map_err(|e| Error::malformed(self.store.path(), e.to_string()))?;
            specifiers.push(rendered);
        }

        if specifiers.is_empty() {
            info!("no applicable dependencies to install");
            return Ok(Outcome::default());
        }

        self.installer.install(&specifiers)?;
        info!(count = specifiers.len(), "installed dependencies");

        Ok(Outcome {
            installer_args: specifiers,
            manifest_written: false,
        })
    }

    /// Uninstall packages and drop them from both sections
    pub fn uninstall<S: AsRef<str>>(&self, packages: &[S]) -> Result<Outcome> {
        let args = ParsedArgs::parse(packages)?;
        if args.is_empty() {
            return Ok(Outcome::default());
        }

        let mut manifest = self.store.load()?;
        self.installer.uninstall(&args.raw)?;

        for name in args.names() {
            if !manifest.remove(name) {
                debug!(package = %name, "not listed in the manifest");
            }
        }

        self.store.save(&manifest)?;
        info!(count = args.specifiers.len(), "uninstalled packages");

        Ok(Outcome {
            installer_args: args.raw,
            manifest_written: true,
        })
    }

    /// Upgrade outdated, non-external dependencies and re-pin them.
    ///
    /// With named packages, only those that are also updatable and outdated
    /// are touched.
    pub fn update<S: AsRef<str>>(&self, packages: &[S]) -> Result<Outcome> {
        let args = ParsedArgs::parse(packages)?;
        let mut manifest = self.store.load()?;

        let updatable = manifest.updatable();
        let outdated = self.installer.outdated()?;

        let targets: Vec<String> = if args.is_empty() {
            updatable
                .iter()
                .filter(|name| outdated.contains_key(*name))
                .cloned()
                .collect()
        } else {
            let mut seen = HashSet::new();
            args.names()
                .filter(|name| updatable.contains(*name) && outdated.contains_key(*name))
                .filter(|name| seen.insert(*name))
                .map(String::from)
                .collect()
        };

        if targets.is_empty() {
            info!("all dependencies are up to date");
            return Ok(Outcome::default());
        }

        self.installer.update(&targets)?;
        let installed = self.installer.installed()?;

        let pins = targets
            .iter()
            .map(|name| pin(&installed, name).map(|version| (name, version)))
            .collect::<Result<Vec<_>>>()?;
        for (name, version) in &pins {
            debug!(package = %name, %version, "re-pinning");
            manifest.repin(name, version);
        }

        self.store.save(&manifest)?;
        info!(count = targets.len(), "updated packages");

        Ok(Outcome {
            installer_args: targets,
            manifest_written: true,
        })
    }

    /// Print installed packages
    pub fn list(&self) -> Result<()> {
        self.installer.list()
    }

    /// Print outdated packages
    pub fn outdated(&self) -> Result<()> {
        self.installer.list_outdated()
    }
}

/// Compatible-release pin on the currently installed version of `name`
fn pin(installed: &Installed, name: &str) -> Result<String> {
    installed
        .get(name)
        .map(|version| format!("{COMPATIBLE}{version}"))
        .ok_or_else(|| Error::unknown(format!("'{name}' is not reported as installed")))
}
