//! Svcwrap registers an executable (itself, or any other program) as a system
//! service and manages it through whichever init system the host runs:
//! systemd, a sysv-style `/etc/init.d` setup, or supervisord. It generates the
//! service artifact from a template, registers it, and starts, stops, queries
//! and tails the service on request.

/// Atomic artifact writes and removal.
pub mod artifact;

/// Per-init-system backends.
pub mod backend;

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Paths, binaries and defaults shared across backends.
pub mod constants;

/// Shortcuts for managing the running executable itself.
pub mod current;

/// Service facade.
pub mod daemon;

/// Init-system detection.
pub mod detect;

/// Error handling.
pub mod error;

/// Host context: command runner and filesystem root.
pub mod host;

/// Log file preparation.
pub mod logs;

/// Root privilege checks.
pub mod privilege;

/// External command execution.
pub mod process;

/// Service state reporting.
pub mod status;

/// Artifact templates.
pub mod template;

#[doc(hidden)]
pub mod test_utils;

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use daemon::Daemon;
pub use detect::BackendKind;
pub use error::{DaemonError, Result};
pub use host::Host;
pub use status::ServiceStatus;
