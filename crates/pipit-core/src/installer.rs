//! Collaborator traits for the package installer and environment creation
//!
//! The reconciler never spawns processes itself. The binary provides
//! process-backed implementations; tests provide recording fakes.

use crate::types::Installed;
use crate::Result;
use std::path::Path;

/// The package installer of an isolated environment.
///
/// Every call blocks until the installer exits. A non-zero exit is reported
/// as [`crate::Error::InstallerFailure`].
pub trait Installer {
    /// Install the given specifiers, forwarded verbatim
    fn install(&self, args: &[String]) -> Result<()>;

    /// Uninstall the given packages without prompting
    fn uninstall(&self, names: &[String]) -> Result<()>;

    /// Upgrade the given packages
    fn update(&self, names: &[String]) -> Result<()>;

    /// Currently installed packages
    fn installed(&self) -> Result<Installed>;

    /// Installed packages with a newer release available
    fn outdated(&self) -> Result<Installed>;

    /// Print installed packages to the terminal
    fn list(&self) -> Result<()>;

    /// Print outdated packages to the terminal
    fn list_outdated(&self) -> Result<()>;

    /// Version string of the environment's interpreter
    fn interpreter_version(&self) -> Result<String>;
}

/// Creates isolated environments
pub trait Provisioner {
    /// Whether an environment already exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Create an environment at `path`, optionally with a specific interpreter
    fn create(&self, path: &Path, interpreter: Option<&str>) -> Result<()>;
}
