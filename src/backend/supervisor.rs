//! Supervisor-based backend (supervisord).
use std::{path::PathBuf, sync::OnceLock};

use regex::Regex;
use tracing::{debug, info};

use crate::{
    artifact,
    backend::resolve_executable,
    config::ServiceConfig,
    constants::{CONFIG_FILE_MODE, SUPERVISORCTL, SUPERVISOR_CONF_DIR},
    error::{DaemonError, Result},
    host::Host,
    logs::ensure_log_file,
    privilege::check_privileges,
    status::ServiceStatus,
    template::SUPERVISOR_PROGRAM,
};

/// Manages a service as a supervisord program.
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: ServiceConfig,
    host: Host,
}

impl Supervisor {
    /// Wraps a configuration for a supervisor-managed host.
    pub fn new(config: ServiceConfig, host: Host) -> Self {
        Self { config, host }
    }

    /// The managed configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// `/etc/supervisor/conf.d/<name>.ini`.
    pub fn program_path(&self) -> PathBuf {
        self.host
            .path(format!("{SUPERVISOR_CONF_DIR}/{}.ini", self.config.name))
    }

    fn is_installed(&self) -> bool {
        artifact::exists(&self.program_path())
    }

    fn is_running(&self) -> bool {
        self.host
            .output(SUPERVISORCTL, &["status", &self.config.name])
            .map(|output| output.success && parse_is_running(&output.stdout))
            .unwrap_or(false)
    }

    /// Writes the program block, prepares the log file and registers the
    /// program with the running supervisor.
    pub fn install(&mut self) -> Result<()> {
        check_privileges(&self.host)?;
        if self.is_installed() {
            return Err(DaemonError::AlreadyInstalled);
        }

        self.config.exec = resolve_executable(&self.config.exec)?;
        let block = SUPERVISOR_PROGRAM.render(&self.config)?;
        let path = self.program_path();
        artifact::write_atomic(&path, &block, CONFIG_FILE_MODE)?;

        let registered = ensure_log_file(&self.config.log_file)
            .and_then(|()| self.host.run(SUPERVISORCTL, &["reread"]))
            .and_then(|()| self.host.run(SUPERVISORCTL, &["add", &self.config.name]));
        if let Err(err) = registered {
            artifact::discard(&path);
            return Err(err);
        }

        info!("Installed {} at {}", self.config.name, path.display());
        Ok(())
    }

    /// Programs autostart with the supervisor; nothing to do.
    pub fn enable(&self) -> Result<()> {
        Ok(())
    }

    /// Removing the program is the only way to stop autostart; nothing to do.
    pub fn disable(&self) -> Result<()> {
        Ok(())
    }

    /// Stops and unregisters the program, then deletes its block.
    pub fn remove(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }

        if let Err(err) = self.stop() {
            debug!("Ignoring stop failure during remove: {err}");
        }
        if let Err(err) = self.host.run(SUPERVISORCTL, &["remove", &self.config.name]) {
            debug!("Ignoring supervisorctl remove failure: {err}");
        }
        if let Err(err) = artifact::remove(&self.program_path()) {
            debug!("Ignoring program block removal failure: {err}");
        }
        if let Err(err) = self.host.run(SUPERVISORCTL, &["reread"]) {
            debug!("Ignoring reread failure during remove: {err}");
        }

        info!("Removed {}", self.config.name);
        Ok(())
    }

    /// Starts the program.
    pub fn start(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if self.is_running() {
            return Err(DaemonError::AlreadyRunning);
        }
        ensure_log_file(&self.config.log_file)?;
        self.host.run(SUPERVISORCTL, &["start", &self.config.name])?;
        info!("Started {}", self.config.name);
        Ok(())
    }

    /// Stops the program.
    pub fn stop(&self) -> Result<()> {
        check_privileges(&self.host)?;
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        if !self.is_running() {
            return Err(DaemonError::AlreadyStopped);
        }
        self.host.run(SUPERVISORCTL, &["stop", &self.config.name])?;
        info!("Stopped {}", self.config.name);
        Ok(())
    }

    /// Reports the state shown by `supervisorctl status`, whatever its exit
    /// status: supervisorctl exits non-zero for any program not RUNNING. Does
    /// not require root: the control socket decides who may query it.
    pub fn status(&self) -> Result<ServiceStatus> {
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        let status = match self.host.output(SUPERVISORCTL, &["status", &self.config.name]) {
            Ok(output) => parse_status(&output.stdout),
            Err(err) => {
                debug!("Treating failed status query as stopped: {err}");
                ServiceStatus::Stopped
            }
        };
        Ok(status)
    }

    /// Follows the program's output through the supervisor.
    pub fn log(&self) -> Result<()> {
        if !self.is_installed() {
            return Err(DaemonError::NotInstalled);
        }
        ensure_log_file(&self.config.log_file)?;
        self.host
            .follow(SUPERVISORCTL, &["tail", "-f", &self.config.name])
    }
}

fn state_word() -> &'static Regex {
    static STATE: OnceLock<Regex> = OnceLock::new();
    STATE.get_or_init(|| {
        Regex::new(r"\b(STARTING|RUNNING|STOPPED|STOPPING|BACKOFF|EXITED|FATAL|UNKNOWN)\b")
            .expect("static regex")
    })
}

fn program_pid() -> &'static Regex {
    static PID: OnceLock<Regex> = OnceLock::new();
    PID.get_or_init(|| Regex::new(r"pid ([0-9]+)").expect("static regex"))
}

/// A program counts as running while it is RUNNING or STARTING.
pub fn parse_is_running(output: &str) -> bool {
    matches!(
        state_word().find(output).map(|m| m.as_str()),
        Some("RUNNING" | "STARTING")
    )
}

/// Interprets `supervisorctl status <name>` output.
pub fn parse_status(output: &str) -> ServiceStatus {
    match state_word().find(output).map(|m| m.as_str()) {
        Some("STARTING") => ServiceStatus::Starting,
        Some("RUNNING") => {
            let pid = program_pid()
                .captures(output)
                .and_then(|caps| caps[1].parse().ok());
            ServiceStatus::Running { pid }
        }
        _ => ServiceStatus::Stopped,
    }
}
