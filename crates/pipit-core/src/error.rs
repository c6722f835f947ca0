//! Error types for pipit-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using pipit-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling the manifest
#[derive(Debug, Error)]
pub enum Error {
    /// A package argument matched neither the VCS nor the PyPI form
    #[error("Malformed package argument: '{0}'")]
    MalformedSpecifier(String),

    /// The manifest file does not exist
    #[error("Dependency file not found: {0}")]
    ManifestNotFound(PathBuf),

    /// The manifest exists but is not a valid document
    #[error("Malformed dependency file {path}: {reason}")]
    ManifestMalformed {
        /// Path to the manifest
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The external installer exited unsuccessfully
    #[error("{program} exited with status {}", exit_status(.code))]
    InstallerFailure {
        /// Program that was run
        program: String,
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
    },

    /// Underlying OS or filesystem failure
    #[error("IO error: {0}")]
    Environment(#[from] std::io::Error),

    /// Anything else
    #[error("{0}")]
    Unknown(String),
}

fn exit_status(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// User-facing category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad package arguments or a bad manifest
    Malformed,
    /// Manifest missing
    NotFound,
    /// Installer already reported the failure
    Installer,
    /// OS or filesystem failure
    Environment,
    /// Catch-all
    Unknown,
}

impl ErrorKind {
    /// The single diagnostic line shown for this category.
    ///
    /// Installer failures have no line of their own; the installer has
    /// already printed its output.
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Malformed => Some("malformed dependency file or package arguments"),
            Self::NotFound => Some("the dependency file could not be found"),
            Self::Installer => None,
            Self::Environment => Some("an operating system error occurred"),
            Self::Unknown => Some("an unknown error occurred"),
        }
    }
}

impl Error {
    /// Create a new catch-all error
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }

    /// Create a malformed-manifest error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ManifestMalformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Category used for the top-level diagnostic
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSpecifier(_) | Self::ManifestMalformed { .. } => ErrorKind::Malformed,
            Self::ManifestNotFound(_) => ErrorKind::NotFound,
            Self::InstallerFailure { .. } => ErrorKind::Installer,
            Self::Environment(_) => ErrorKind::Environment,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }
}
