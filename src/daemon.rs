//! The facade callers use to manage a service.
use std::path::PathBuf;

use tracing::debug;

use crate::{
    backend::Backend,
    config::{ServiceConfig, ServiceConfigBuilder},
    detect::{BackendKind, detect},
    error::Result,
    host::Host,
    status::ServiceStatus,
};

/// A service bound to the init system detected on its host.
///
/// ```no_run
/// use svcwrap::{Daemon, ServiceConfigBuilder};
///
/// let mut daemon = Daemon::new(
///     ServiceConfigBuilder::new()
///         .name("wrapother")
///         .exec("/home/shgsec/wrapother")
///         .user("shgsec")
///         .group("shgsec"),
/// )?;
/// daemon.install()?;
/// daemon.start()?;
/// println!("{}", daemon.status()?);
/// # Ok::<(), svcwrap::DaemonError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Daemon {
    backend: Backend,
}

impl Daemon {
    /// Builds the configuration and binds it to the local host.
    pub fn new(builder: ServiceConfigBuilder) -> Result<Self> {
        Self::with_host(builder, Host::system())
    }

    /// Builds the configuration and binds it to `host`.
    pub fn with_host(builder: ServiceConfigBuilder, host: Host) -> Result<Self> {
        let config = builder.build()?;
        Self::from_config(config, host)
    }

    /// Detects the host's init system and binds an already built
    /// configuration to it.
    pub fn from_config(config: ServiceConfig, host: Host) -> Result<Self> {
        let kind = detect(&host)?;
        debug!("Managing '{}' through {kind}", config.name);
        Ok(Self::from_backend(Backend::new(kind, config, host)))
    }

    /// Wraps an explicitly chosen backend, bypassing detection.
    pub fn from_backend(backend: Backend) -> Self {
        Self { backend }
    }

    /// Which init system manages the service.
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The service configuration.
    pub fn config(&self) -> &ServiceConfig {
        self.backend.config()
    }

    /// Path of the generated life-cycle artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.backend.artifact_path()
    }

    /// Generates the artifact and registers the service.
    pub fn install(&mut self) -> Result<()> {
        self.backend.install()
    }

    /// Enables the service at boot where the backend needs a separate step.
    pub fn enable(&self) -> Result<()> {
        self.backend.enable()
    }

    /// Disables the service at boot where supported.
    pub fn disable(&self) -> Result<()> {
        self.backend.disable()
    }

    /// Stops, deregisters and deletes the service.
    pub fn remove(&self) -> Result<()> {
        self.backend.remove()
    }

    /// Starts the installed service.
    pub fn start(&self) -> Result<()> {
        self.backend.start()
    }

    /// Stops the running service.
    pub fn stop(&self) -> Result<()> {
        self.backend.stop()
    }

    /// Reports whether the service is starting, running or stopped.
    pub fn status(&self) -> Result<ServiceStatus> {
        self.backend.status()
    }

    /// Follows the service log until interrupted.
    pub fn log(&self) -> Result<()> {
        self.backend.log()
    }
}
