//! Command dispatch
//!
//! Wires the settings, the process-backed collaborators and the reconciler
//! together for one invocation.

use crate::cli::{self, Cli, Command};
use crate::process::{PipInstaller, VirtualenvProvisioner};
use anyhow::{Context, Result};
use pipit_config::{ConfigManager, Settings};
use pipit_core::{ManifestStore, Outcome, Reconciler};
use std::path::Path;
use tracing::{debug, info};

/// Run the parsed command line
pub fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        cli::command().print_help()?;
        return Ok(());
    };

    let manager = ConfigManager::load(cli.config.as_deref()).context("failed to load settings")?;
    debug!(path = %manager.config_path().display(), "using settings");

    let root = std::env::current_dir().context("failed to read the working directory")?;
    dispatch(command, &root, manager.settings())
}

/// Run one subcommand against the project at `root`
pub fn dispatch(command: Command, root: &Path, settings: &Settings) -> Result<()> {
    let env = root.join(&settings.environment.directory);
    let installer = PipInstaller::new(&env, settings.installer.program.clone());
    let provisioner = VirtualenvProvisioner::new(&settings.environment.creator);
    let store = ManifestStore::new(root, &settings.manifest.file);
    let reconciler = Reconciler::new(&installer, &provisioner, store)
        .with_env_dir(&settings.environment.directory);

    debug!(installer = %installer.program().display(), "resolved installer");

    match command {
        Command::New { path, python } => {
            let outcome = reconciler
                .new_environment(path.as_deref(), python.as_deref())
                .context("failed to create the environment")?;
            log_outcome("new", &outcome);
        }
        Command::Install { packages, dev } => {
            let outcome = reconciler
                .install(&packages, dev)
                .context("failed to install")?;
            log_outcome("install", &outcome);
        }
        Command::Uninstall { packages } => {
            let outcome = reconciler
                .uninstall(&packages)
                .context("failed to uninstall")?;
            log_outcome("uninstall", &outcome);
        }
        Command::Update { packages } => {
            let outcome = reconciler.update(&packages).context("failed to update")?;
            log_outcome("update", &outcome);
        }
        Command::List => reconciler.list().context("failed to list packages")?,
        Command::Outdated => reconciler
            .outdated()
            .context("failed to list outdated packages")?,
    }
    Ok(())
}

fn log_outcome(command: &str, outcome: &Outcome) {
    info!(
        command,
        installer_args = ?outcome.installer_args,
        manifest_written = outcome.manifest_written,
        "done"
    );
}
