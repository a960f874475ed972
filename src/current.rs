//! Shortcuts for managing the running executable itself.
//!
//! The first call builds a [`Daemon`] from the defaults describing the current
//! executable and the local host. If that fails (unknown init system, no
//! resolvable executable) every shortcut returns
//! [`DaemonError::UnsupportedSystem`]. Library code that needs anything beyond
//! the defaults should construct a [`Daemon`] explicitly.
use std::sync::{Mutex, OnceLock};

use tracing::debug;

use crate::{
    config::ServiceConfigBuilder,
    daemon::Daemon,
    error::{DaemonError, Result},
    status::ServiceStatus,
};

type Slot = OnceLock<Option<Mutex<Daemon>>>;

static SELF_DAEMON: Slot = OnceLock::new();

fn with_self<T>(op: impl FnOnce(&mut Daemon) -> Result<T>) -> Result<T> {
    with_slot(&SELF_DAEMON, || Daemon::new(ServiceConfigBuilder::new()), op)
}

/// Runs `op` on the daemon held in `slot`, building it on first use. A failed
/// build is remembered and every call then returns
/// [`DaemonError::UnsupportedSystem`].
fn with_slot<T>(
    slot: &Slot,
    build: impl FnOnce() -> Result<Daemon>,
    op: impl FnOnce(&mut Daemon) -> Result<T>,
) -> Result<T> {
    let slot = slot.get_or_init(|| match build() {
        Ok(daemon) => Some(Mutex::new(daemon)),
        Err(err) => {
            debug!("No default daemon for this executable: {err}");
            None
        }
    });
    let Some(daemon) = slot else {
        return Err(DaemonError::UnsupportedSystem);
    };
    let mut guard = daemon
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    op(&mut guard)
}

/// Installs the running executable as a service.
pub fn install() -> Result<()> {
    with_self(|d| d.install())
}

/// Enables the running executable's service at boot.
pub fn enable() -> Result<()> {
    with_self(|d| d.enable())
}

/// Disables the running executable's service at boot.
pub fn disable() -> Result<()> {
    with_self(|d| d.disable())
}

/// Removes the running executable's service.
pub fn remove() -> Result<()> {
    with_self(|d| d.remove())
}

/// Starts the running executable's service.
pub fn start() -> Result<()> {
    with_self(|d| d.start())
}

/// Stops the running executable's service.
pub fn stop() -> Result<()> {
    with_self(|d| d.stop())
}

/// Reports the running executable's service state.
pub fn status() -> Result<ServiceStatus> {
    with_self(|d| d.status())
}

/// Streams the running executable's service log.
pub fn log() -> Result<()> {
    with_self(|d| d.log())
}
