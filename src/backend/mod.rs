//! The three init-system backends behind one life-cycle contract.
//!
//! Every backend implements install, enable, disable, remove, start, stop,
//! status and log with the same guards: privilege and existence checks run
//! first and return a sentinel error before anything is touched, install is
//! all-or-nothing, and remove tolerates failures of its stop/deregister steps.
use std::path::{Path, PathBuf};

use crate::{
    config::ServiceConfig,
    constants::LOG_BANNER,
    detect::BackendKind,
    error::{DaemonError, Result},
    host::Host,
    status::ServiceStatus,
};

pub mod supervisor;
pub mod systemd;
pub mod sysv;

pub use supervisor::Supervisor;
pub use systemd::Systemd;
pub use sysv::SysV;

/// A service bound to one init system.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Unit-based manager.
    Systemd(Systemd),
    /// Sysv-style init scripts.
    SysV(SysV),
    /// Supervisor-managed program.
    Supervisor(Supervisor),
}

impl Backend {
    /// Binds `config` to the backend for `kind`.
    pub fn new(kind: BackendKind, config: ServiceConfig, host: Host) -> Self {
        match kind {
            BackendKind::Systemd => Backend::Systemd(Systemd::new(config, host)),
            BackendKind::Sysv => Backend::SysV(SysV::new(config, host)),
            BackendKind::Supervisor => Backend::Supervisor(Supervisor::new(config, host)),
        }
    }

    /// Which init system this backend drives.
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Systemd(_) => BackendKind::Systemd,
            Backend::SysV(_) => BackendKind::Sysv,
            Backend::Supervisor(_) => BackendKind::Supervisor,
        }
    }

    /// The managed configuration.
    pub fn config(&self) -> &ServiceConfig {
        match self {
            Backend::Systemd(b) => b.config(),
            Backend::SysV(b) => b.config(),
            Backend::Supervisor(b) => b.config(),
        }
    }

    /// Path of the artifact whose presence means "installed".
    pub fn artifact_path(&self) -> PathBuf {
        match self {
            Backend::Systemd(b) => b.unit_path(),
            Backend::SysV(b) => b.script_path(),
            Backend::Supervisor(b) => b.program_path(),
        }
    }

    /// Generates the artifact and registers the service.
    pub fn install(&mut self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.install(),
            Backend::SysV(b) => b.install(),
            Backend::Supervisor(b) => b.install(),
        }
    }

    /// Activates the service at boot where the init system needs a separate
    /// step for it.
    pub fn enable(&self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.enable(),
            Backend::SysV(b) => b.enable(),
            Backend::Supervisor(b) => b.enable(),
        }
    }

    /// Deactivates the service at boot where supported.
    pub fn disable(&self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.disable(),
            Backend::SysV(b) => b.disable(),
            Backend::Supervisor(b) => b.disable(),
        }
    }

    /// Stops, deregisters and deletes the service's artifacts.
    pub fn remove(&self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.remove(),
            Backend::SysV(b) => b.remove(),
            Backend::Supervisor(b) => b.remove(),
        }
    }

    /// Starts an installed, stopped service.
    pub fn start(&self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.start(),
            Backend::SysV(b) => b.start(),
            Backend::Supervisor(b) => b.start(),
        }
    }

    /// Stops an installed, running service.
    pub fn stop(&self) -> Result<()> {
        match self {
            Backend::Systemd(b) => b.stop(),
            Backend::SysV(b) => b.stop(),
            Backend::Supervisor(b) => b.stop(),
        }
    }

    /// Queries the current state.
    pub fn status(&self) -> Result<ServiceStatus> {
        match self {
            Backend::Systemd(b) => b.status(),
            Backend::SysV(b) => b.status(),
            Backend::Supervisor(b) => b.status(),
        }
    }

    /// Streams the service's log until interrupted.
    pub fn log(&self) -> Result<()> {
        if !crate::artifact::exists(&self.artifact_path()) {
            return Err(DaemonError::NotInstalled);
        }
        println!("{LOG_BANNER}");
        match self {
            Backend::Systemd(b) => b.log(),
            Backend::SysV(b) => b.log(),
            Backend::Supervisor(b) => b.log(),
        }
    }
}

/// Resolves the configured executable to an absolute path, searching `PATH`
/// for bare names.
pub fn resolve_executable(exec: &Path) -> Result<PathBuf> {
    let found = which::which(exec).map_err(|source| DaemonError::ExecutableNotFound {
        exec: exec.display().to_string(),
        source,
    })?;
    std::path::absolute(&found).map_err(|source| DaemonError::io(found, source))
}
