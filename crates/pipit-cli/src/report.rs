//! Top-level error reporting
//!
//! Every failure is reduced to one fixed line on stderr and exit status 1,
//! except installer failures, which stay silent and pass the installer's own
//! exit status through.

use colored::*;
use pipit_config::ConfigError;
use pipit_core::{Error, ErrorKind};
use std::process::ExitCode;
use tracing::debug;

/// How a failure is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    /// Print nothing and exit with this status
    Silent(u8),
    /// Print this line and exit with status 1
    Message(&'static str),
}

impl Diagnosis {
    /// Exit status for this diagnosis
    pub fn exit_code(self) -> u8 {
        match self {
            Diagnosis::Silent(code) => code,
            Diagnosis::Message(_) => 1,
        }
    }
}

/// Classify an error by the first recognized cause in its chain
pub fn diagnose(err: &anyhow::Error) -> Diagnosis {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<Error>() {
            return diagnose_core(err);
        }
        if let Some(err) = cause.downcast_ref::<ConfigError>() {
            return diagnose_config(err);
        }
    }
    Diagnosis::Message(unknown())
}

fn diagnose_core(err: &Error) -> Diagnosis {
    if let Error::InstallerFailure { code, .. } = err {
        let status = code.and_then(|code| u8::try_from(code).ok()).unwrap_or(1);
        return Diagnosis::Silent(if status == 0 { 1 } else { status });
    }
    Diagnosis::Message(err.kind().message().unwrap_or_else(unknown))
}

fn diagnose_config(err: &ConfigError) -> Diagnosis {
    let kind = match err {
        ConfigError::Io(_) | ConfigError::ConfigNotFound(_) | ConfigError::HomeNotFound => {
            ErrorKind::Environment
        }
        ConfigError::TomlDe(_) => ErrorKind::Unknown,
    };
    Diagnosis::Message(kind.message().unwrap_or_else(unknown))
}

fn unknown() -> &'static str {
    ErrorKind::Unknown.message().unwrap_or("an unknown error occurred")
}

/// Print the diagnostic for `err` and return the process exit status
pub fn report(err: &anyhow::Error) -> ExitCode {
    debug!("{err:#}");

    let diagnosis = diagnose(err);
    if let Diagnosis::Message(line) = diagnosis {
        eprintln!("pipit: {} {}", "error:".red().bold(), line);
    }
    ExitCode::from(diagnosis.exit_code())
}
