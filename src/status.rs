//! Reportable service states.
use std::fmt;

use serde::Serialize;

/// Outcome of a status query. A stopped service is a normal result, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServiceStatus {
    /// The service manager is bringing the service up.
    Starting,
    /// The service is running; the PID is known when the backend reports it.
    Running {
        /// Main process id.
        #[serde(skip_serializing_if = "Option::is_none")]
        pid: Option<u32>,
    },
    /// The service is not running.
    Stopped,
}

impl ServiceStatus {
    /// Whether the service is up or coming up.
    pub fn is_active(&self) -> bool {
        !matches!(self, ServiceStatus::Stopped)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Starting => write!(f, "Service is starting..."),
            ServiceStatus::Running { pid: Some(pid) } => {
                write!(f, "Service (pid {pid}) is running")
            }
            ServiceStatus::Running { pid: None } => write!(f, "Service is running"),
            ServiceStatus::Stopped => write!(f, "Service has stopped"),
        }
    }
}
