//! Unit-based backend (systemd).
use std::{path::PathBuf, sync::OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::{
    artifact,
    backend::resolve_executable,
    config::ServiceConfig,
    constants::{CONFIG_FILE_MODE, JOURNALCTL, SYSTEMCTL, SYSTEMD_UNIT_DIR},
    error::{DaemonError, Result},
    host::Host,
    privilege::check_privileges,
    status::ServiceStatus,
    template::SYSTEMD_UNIT,
};

/// Manages a service through a unit file and `systemctl`.
#[derive(Debug, Clone)]
pub struct Systemd {
    config: ServiceConfig,
    host: Host,
}

impl Systemd {
    /// Wraps a configuration for a unit-based host.
    pub fn new(config: ServiceConfig, host: Host) -> Self {
        Self { config, host }
    }

    /// The managed configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `/etc/systemd/system/<name>.service`.
    pub fn unit_path(&self) -> PathBuf {
        self.host
            .path(format!("{SYSTEMD_UNIT_DIR}/{}.service", self.config.name))
    }

    fn unit_name(&self) -> String {
        format!("{}.service", self.config.name)
    }

    fn is_installed(&self) -> bool {
        artifact::exists(&self.unit_path())
    }

    fn is_running(&self) -> bool {
        self.host
            .output(SYSTEMCTL, &["is-active", &self.unit_name()])
            .map(|output| output.success && parse_is_active(&output.stdout))
            .unwrap_or(false)
    }

    /// Writes the unit file, reloads the manager and enables the unit at boot.
    pub fn install(&mut self) -> Result<()> {
        check_privileges(&self.host)?;
        if self.is_installed() {
            return Err(DaemonError::AlreadyInstalled);
        }

        self.config.exec = resolve_executable(&self.config.exec)?;
        let unit = SYSTEMD_UNIT.render(&self.config)?;
        let path = self.unit_path();
        artifact::write_atomic(&path, &unit, CONFIG_FILE_MODE)?;

        let unit_name = self.unit_name();
        let registered = self
            .host
            .run(SYSTEMCTL, &["daemon-reload"])
            .and_then(|()| self.host.run(SYSTEMCTL, &["enable", &unit_name]));
        if let Err(err) = registered {
            artifact::discard(&path);
            return Err(err);
        }

        info!("Installed {} at {}", self.config.name, path.display());
        Ok(())
    }

    /// Boot activation is handled by install; nothing to do.
    pub fn enable(&self) -> Result<()> {
        Ok(())
    }

    /// Boot deactivation is handled by remove; nothing to do.
    pub fn disable(&self) -> Result<()> {
        Ok(())
    }

    /// Stops and disables the unit, then deletes the unit file.
    pub fn remove(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }

        if let Err(err) = self.stop() {
            debug!("Ignoring stop failure during remove: {err}");
        }
        if let Err(err) = self.host.run(SYSTEMCTL, &["disable", &self.unit_name()]) {
            debug!("Ignoring disable failure during remove: {err}");
        }
        if let Err(err) = artifact::remove(&self.unit_path()) {
            debug!("Ignoring unit removal failure: {err}");
        }
        if let Err(err) = self.host.run(SYSTEMCTL, &["daemon-reload"]) {
            debug!("Ignoring daemon-reload failure during remove: {err}");
        }

        info!("Removed {}", self.config.name);
        Ok(())
    }

    /// Starts the unit.
    pub fn start(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if self.is_running() {
            return Err(DaemonError::AlreadyRunning);
        }
        self.host.run(SYSTEMCTL, &["start", &self.config.name])?;
        info!("Started {}", self.config.name);
        Ok(())
    }

    /// Stops the unit.
    pub fn stop(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if !self.is_running() {
            return Err(DaemonError::AlreadyStopped);
        }
        self.host.run(SYSTEMCTL, &["stop", &self.config.name])?;
        info!("Stopped {}", self.config.name);
        Ok(())
    }

    /// Reports the unit's state from `systemctl status`. The output is parsed
    /// whatever the exit status: systemctl exits 3 for every unit that is not
    /// active, including one that is still activating.
    pub fn status(&self) -> Result<ServiceStatus> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        let status = match self.host.output(SYSTEMCTL, &["status", &self.unit_name()]) {
            Ok(output) => parse_status(&output.stdout),
            Err(err) => {
                debug!("Treating failed status query as stopped: {err}");
                ServiceStatus::Stopped
            }
        };
        Ok(status)
    }

    /// Follows the unit's journal.
    pub fn log(&self) -> Result<()> {
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        self.host.follow(JOURNALCTL, &["-fu", &self.config.name])
    }
}

/// `systemctl is-active` prints exactly `active` for a running unit.
pub fn parse_is_active(output: &str) -> bool {
    output.trim().eq_ignore_ascii_case("active")
}

fn main_pid() -> &'static Regex {
    static MAIN_PID: OnceLock<Regex> = OnceLock::new();
    MAIN_PID.get_or_init(|| Regex::new(r"Main PID: ([0-9]+)").expect("static regex"))
}

/// Interprets `systemctl status` output.
pub fn parse_status(output: &str) -> ServiceStatus {
    if output.contains("Active: active") {
        let pid = main_pid()
            .captures(output)
            .and_then(|caps| caps[1].parse().ok());
        ServiceStatus::Running { pid }
    } else if output.contains("Active: activating") {
        ServiceStatus::Starting
    } else {
        ServiceStatus::Stopped
    }
}
