//! Sysv-style backend: an init script, a log-rotation config and `chkconfig`.
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::{
    artifact,
    backend::resolve_executable,
    config::ServiceConfig,
    constants::{
        CHKCONFIG, CONFIG_FILE_MODE, INIT_SCRIPT_MODE, LOGROTATE_DIR, SERVICE,
        SYSV_INIT_DIR,
    },
    error::{DaemonError, Result},
    host::Host,
    logs::ensure_log_file,
    privilege::check_privileges,
    status::ServiceStatus,
    template::{LOGROTATE_CONF, SYSV_SCRIPT},
};

/// Manages a service through `/etc/init.d`, `service` and `chkconfig`.
#[derive(Debug, Clone)]
pub struct SysV {
    config: ServiceConfig,
    host: Host,
}

impl SysV {
    /// Wraps a configuration for a sysv-style host.
    pub fn new(config: ServiceConfig, host: Host) -> Self {
        Self { config, host }
    }

    /// The managed configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `/etc/init.d/<name>`.
    pub fn script_path(&self) -> PathBuf {
        self.host
            .path(format!("{SYSV_INIT_DIR}/{}", self.config.name))
    }

    /// `/etc/logrotate.d/<name>`.
    pub fn logrotate_path(&self) -> PathBuf {
        self.host
            .path(format!("{LOGROTATE_DIR}/{}", self.config.name))
    }

    fn is_installed(&self) -> bool {
        artifact::exists(&self.script_path())
    }

    fn is_running(&self) -> bool {
        self.host
            .output(SERVICE, &[&self.config.name, "status"])
            .map(|output| output.success && mentions_service(&self.config.name, &output.stdout))
            .unwrap_or(false)
    }

    /// Writes the init script and rotation config, then registers the script
    /// for boot activation. Nothing is left behind if any step fails.
    pub fn install(&mut self) -> Result<()> {
        check_privileges(&self.host)?;
        if self.is_installed() {
            return Err(DaemonError::AlreadyInstalled);
        }

        self.config.exec = resolve_executable(&self.config.exec)?;
        let script = SYSV_SCRIPT.render(&self.config)?;
        let script_path = self.script_path();
        artifact::write_atomic(&script_path, &script, INIT_SCRIPT_MODE)?;

        let result = self
            .configure_log_rotation()
            .and_then(|()| self.register());
        if let Err(err) = result {
            artifact::discard(&self.logrotate_path());
            artifact::discard(&script_path);
            return Err(err);
        }

        info!("Installed {} at {}", self.config.name, script_path.display());
        Ok(())
    }

    fn configure_log_rotation(&self) -> Result<()> {
        ensure_log_file(&self.config.log_file)?;
        let lock_dir = parent_or_self(&self.config.lock_file);
        let owner = format!("{}:{}", self.config.user, self.config.group);
        self.host
            .run("chown", &["-R", &owner, &lock_dir.to_string_lossy()])?;

        let conf = LOGROTATE_CONF.render(&self.config)?;
        artifact::write_atomic(&self.logrotate_path(), &conf, CONFIG_FILE_MODE)
    }

    fn register(&self) -> Result<()> {
        self.host.run(CHKCONFIG, &["--add", &self.config.name])
    }

    fn deregister(&self) -> Result<()> {
        self.host.run(CHKCONFIG, &["--del", &self.config.name])
    }

    /// Registers the installed script for boot activation.
    pub fn enable(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        self.register()?;
        info!("Enabled {}", self.config.name);
        Ok(())
    }

    /// Removes the script from boot activation, keeping it installed.
    pub fn disable(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        self.deregister()?;
        info!("Disabled {}", self.config.name);
        Ok(())
    }

    /// Stops and deregisters the service, then deletes the init script and
    /// its rotation config. Only failing to delete the script is fatal.
    pub fn remove(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }

        if let Err(err) = self.host.run(SERVICE, &[&self.config.name, "stop"]) {
            debug!("Ignoring stop failure during remove: {err}");
        }
        if let Err(err) = self.deregister() {
            debug!("Ignoring chkconfig failure during remove: {err}");
        }
        artifact::remove(&self.script_path())?;
        let logrotate = self.logrotate_path();
        if artifact::exists(&logrotate)
            && let Err(err) = artifact::remove(&logrotate)
        {
            warn!("Failed to remove log rotation config: {err}");
        }

        info!("Removed {}", self.config.name);
        Ok(())
    }

    /// Starts the service through its init script.
    pub fn start(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if self.is_running() {
            return Err(DaemonError::AlreadyRunning);
        }
        ensure_log_file(&self.config.log_file)?;
        self.host.run(SERVICE, &[&self.config.name, "start"])?;
        info!("Started {}", self.config.name);
        Ok(())
    }

    /// Stops the service through its init script.
    pub fn stop(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if !self.is_running() {
            return Err(DaemonError::AlreadyStopped);
        }
        self.host.run(SERVICE, &[&self.config.name, "stop"])?;
        info!("Stopped {}", self.config.name);
        Ok(())
    }

    /// Reports the state printed by the init script's `status` action. Any
    /// non-zero LSB status code means the service is not running.
    pub fn status(&self) -> Result<ServiceStatus> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        let status = match self.host.output(SERVICE, &[&self.config.name, "status"]) {
            Ok(output) if output.success => parse_status(&self.config.name, &output.stdout),
            Ok(_) => ServiceStatus::Stopped,
            Err(err) => {
                debug!("Treating failed status query as stopped: {err}");
                ServiceStatus::Stopped
            }
        };
        Ok(status)
    }

    /// Tails the service's log file.
    pub fn log(&self) -> Result<()> {
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        ensure_log_file(&self.config.log_file)?;
        let log_file = self.config.log_file.to_string_lossy();
        self.host.follow("tail", &["-f", &log_file])
    }
}

fn parent_or_self(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => path.to_path_buf(),
    }
}

/// A successful `status` action mentions the service by name.
pub fn mentions_service(name: &str, output: &str) -> bool {
    output.contains(name)
}

fn status_pid() -> &'static Regex {
    static PID: OnceLock<Regex> = OnceLock::new();
    PID.get_or_init(|| Regex::new(r"pid\s+([0-9]+)").expect("static regex"))
}

/// Interprets the output of a successful `service <name> status`.
pub fn parse_status(name: &str, output: &str) -> ServiceStatus {
    if !mentions_service(name, output) {
        debug!("Unrecognised status output for {name}: {}", output.trim());
        return ServiceStatus::Stopped;
    }
    let pid = status_pid()
        .captures(output)
        .and_then(|caps| caps[1].parse().ok());
    ServiceStatus::Running { pid }
}
