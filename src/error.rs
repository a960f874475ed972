//! Error handling for svcwrap.
use std::{io, path::PathBuf};

use thiserror::Error;

/// Defines all possible errors raised while managing a service.
///
/// The unit variants are sentinels: privilege and existence guards return them
/// before any side effect happens, so callers can match on them directly.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// The host init system could not be identified.
    #[error("unsupported system")]
    UnsupportedSystem,

    /// The caller does not run with root group privileges.
    #[error(
        "you must have root user privileges. possibly using 'sudo' command should help"
    )]
    RootPrivileges,

    /// The life-cycle artifact already exists.
    #[error("service has already been installed")]
    AlreadyInstalled,

    /// The life-cycle artifact does not exist.
    #[error("service is not installed")]
    NotInstalled,

    /// Start was requested for a running service.
    #[error("service is already running")]
    AlreadyRunning,

    /// Stop was requested for a stopped service.
    #[error("service has already been stopped")]
    AlreadyStopped,

    /// No executable path was configured.
    #[error("you must specify the executable path")]
    MissingExecValue,

    /// No draft configuration was available to build from.
    #[error("the config can't be nil")]
    ConfigIsNil,

    /// Filesystem operation on an artifact, log file or directory failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: io::Error,
    },

    /// An external command could not be launched.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        /// Command line that failed to launch.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: io::Error,
    },

    /// An external command ran but reported failure.
    #[error("command '{command}' exited with status {code:?}: {stderr}")]
    CommandFailed {
        /// Command line that failed.
        command: String,
        /// Exit code, if the command was not killed by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The configured executable could not be resolved to an absolute path.
    #[error("failed to resolve executable '{exec}': {source}")]
    ExecutableNotFound {
        /// The executable as configured.
        exec: String,
        /// The underlying lookup error.
        #[source]
        source: which::Error,
    },

    /// A bundled template is malformed. This is a packaging defect.
    #[error("failed to render template '{template}': {reason}")]
    Template {
        /// Template name.
        template: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// Error reading a service file.
    #[error("Failed to read service file {}: {source}", path.display())]
    ConfigRead {
        /// Service file path.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: io::Error,
    },

    /// Error parsing a YAML service file.
    #[error("Invalid YAML format: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// The service name is not usable as a file name.
    #[error("invalid service name '{0}': must be a single path component")]
    InvalidName(String),

    /// A service file referenced an unset environment variable.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

impl DaemonError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DaemonError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DaemonError>;
