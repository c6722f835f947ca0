//! Process-backed installer and environment creator
//!
//! Both block on the child process. Output of mutating calls goes straight
//! to the terminal; listings used for pinning are captured from stdout.

use pipit_core::{Error, Installed, Installer, Provisioner, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

const PYTHON_VERSION: &str = "import sys; print(sys.version)";

/// Directory holding an environment's executables
pub fn bin_dir(env: &Path) -> PathBuf {
    env.join(if cfg!(windows) { "Scripts" } else { "bin" })
}

fn executable(env: &Path, name: &str) -> PathBuf {
    let dir = bin_dir(env);
    if cfg!(windows) {
        dir.join(format!("{name}.exe"))
    } else {
        dir.join(name)
    }
}

/// One row of `pip list --format=json`
#[derive(Debug, Deserialize)]
struct Listed {
    name: String,
    version: String,
}

/// Parse a JSON package listing into lowercased name → version
pub fn parse_listing(stdout: &str) -> Result<Installed> {
    let rows: Vec<Listed> = serde_json::from_str(stdout)
        .map_err(|e| Error::unknown(format!("unreadable package listing: {e}")))?;
    Ok(rows
        .into_iter()
        .map(|row| (row.name.to_lowercase(), row.version))
        .collect())
}

/// Interleave `-U` with each package name
pub fn upgrade_args(names: &[String]) -> Vec<String> {
    names
        .iter()
        .flat_map(|name| ["-U".to_string(), name.clone()])
        .collect()
}

fn check(program: &Path, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(Error::InstallerFailure {
        program: program.display().to_string(),
        code: status.code(),
    })
}

/// Drives `pip` inside an environment
#[derive(Debug, Clone)]
pub struct PipInstaller {
    program: PathBuf,
    python: PathBuf,
}

impl PipInstaller {
    /// Use the installer of the environment at `env`, unless `program` overrides it
    pub fn new(env: &Path, program: Option<PathBuf>) -> Self {
        Self {
            program: program.unwrap_or_else(|| executable(env, "pip")),
            python: executable(env, "python"),
        }
    }

    /// Installer executable in use
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<()> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        debug!(program = %self.program.display(), ?args, "running installer");

        let status = Command::new(&self.program).args(&args).status()?;
        check(&self.program, status)
    }

    fn capture(program: &Path, args: &[&str]) -> Result<String> {
        debug!(program = %program.display(), ?args, "capturing output");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit())
            .output()?;
        check(program, output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn listing(&self, extra: &[&str]) -> Result<Installed> {
        let mut args = vec!["list", "--format=json"];
        args.extend_from_slice(extra);
        parse_listing(&Self::capture(&self.program, &args)?)
    }
}

impl Installer for PipInstaller {
    fn install(&self, args: &[String]) -> Result<()> {
        let mut full = vec!["install".to_string()];
        full.extend_from_slice(args);
        self.run(&full)
    }

    fn uninstall(&self, names: &[String]) -> Result<()> {
        let mut full = vec!["uninstall".to_string(), "-y".to_string()];
        full.extend_from_slice(names);
        self.run(&full)
    }

    fn update(&self, names: &[String]) -> Result<()> {
        self.install(&upgrade_args(names))
    }

    fn installed(&self) -> Result<Installed> {
        self.listing(&[])
    }

    fn outdated(&self) -> Result<Installed> {
        self.listing(&["-o"])
    }

    fn list(&self) -> Result<()> {
        self.run(&["list"])
    }

    fn list_outdated(&self) -> Result<()> {
        self.run(&["list", "-o"])
    }

    fn interpreter_version(&self) -> Result<String> {
        let stdout = Self::capture(&self.python, &["-c", PYTHON_VERSION])?;
        Ok(stdout.trim_end().to_string())
    }
}

/// Creates environments with an external program such as `virtualenv`
#[derive(Debug, Clone)]
pub struct VirtualenvProvisioner {
    creator: String,
}

impl VirtualenvProvisioner {
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
        }
    }
}

impl Provisioner for VirtualenvProvisioner {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create(&self, path: &Path, interpreter: Option<&str>) -> Result<()> {
        let mut command = Command::new(&self.creator);
        command.arg(path);
        if let Some(interpreter) = interpreter {
            command.arg("-p").arg(interpreter);
        }

        debug!(creator = %self.creator, path = %path.display(), ?interpreter, "creating environment");
        let status = command.status()?;
        check(Path::new(&self.creator), status)
    }
}
