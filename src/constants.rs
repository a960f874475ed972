//! Constants and configuration values for svcwrap.
//!
//! This module centralizes artifact locations, default path patterns and the
//! names of the host control binaries the backends shell out to.

use std::time::Duration;

// ============================================================================
// Artifact Locations
// ============================================================================

/// Directory holding unit files for the unit-based service manager.
pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

/// Directory holding sysv-style init scripts.
pub const SYSV_INIT_DIR: &str = "/etc/init.d";

/// Directory holding per-service log-rotation configs.
pub const LOGROTATE_DIR: &str = "/etc/logrotate.d";

/// Directory holding supervisor program blocks.
pub const SUPERVISOR_CONF_DIR: &str = "/etc/supervisor/conf.d";

/// Mode for generated init scripts.
pub const INIT_SCRIPT_MODE: u32 = 0o755;

/// Mode for every other generated artifact.
pub const CONFIG_FILE_MODE: u32 = 0o644;

/// Mode for log directories created on demand.
pub const LOG_DIR_MODE: u32 = 0o755;

// ============================================================================
// Service Defaults
// ============================================================================

/// Default run-as user.
pub const DEFAULT_USER: &str = "root";

/// Default run-as group.
pub const DEFAULT_GROUP: &str = "root";

/// Builds the default description for a service name.
pub fn default_description(name: &str) -> String {
    format!("manage the {name} daemon")
}

/// Builds the default log file path for a service name.
pub fn default_log_file(name: &str) -> String {
    format!("/var/log/{name}/{name}.log")
}

/// Builds the default PID file path for a service name.
pub fn default_pid_file(name: &str) -> String {
    format!("/var/run/{name}.pid")
}

/// Builds the default lock file path for a service name.
pub fn default_lock_file(name: &str) -> String {
    format!("/var/lock/subsys/{name}.lock")
}

// ============================================================================
// Host Control Binaries
// ============================================================================

/// Unit-based manager control binary.
pub const SYSTEMCTL: &str = "systemctl";

/// Unit-based manager journal reader.
pub const JOURNALCTL: &str = "journalctl";

/// Sysv-style service wrapper.
pub const SERVICE: &str = "service";

/// Sysv-style boot registration tool.
pub const CHKCONFIG: &str = "chkconfig";

/// Supervisor control client.
pub const SUPERVISORCTL: &str = "supervisorctl";

/// Supervisor daemon binary probed during detection.
pub const SUPERVISORD: &str = "supervisord";

// ============================================================================
// Streaming
// ============================================================================

/// Banner printed before a live log tail.
pub const LOG_BANNER: &str = "==> Press Ctrl-C to exit <==";

/// Interval between child liveness checks while streaming.
pub const STREAM_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time a cancelled child gets to exit after SIGTERM before it is killed.
pub const STREAM_TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// Exit status used when an interrupt arrives outside of a stream.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;
