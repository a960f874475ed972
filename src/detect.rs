//! Host init system detection.
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, info, warn};

use crate::{
    constants::SUPERVISORD,
    error::{DaemonError, Result},
    host::Host,
};

/// The three init systems a service can be registered with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Unit-based manager (systemd).
    Systemd,
    /// Legacy sysv-style init scripts.
    Sysv,
    /// Third-party process supervisor (supervisord).
    Supervisor,
}

/// What process 1 reports itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitProcess {
    /// A unit-based manager.
    Systemd,
    /// A legacy init.
    Init,
}

fn init_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new("(init|systemd)").expect("static regex"))
}

/// Finds the first init marker in `ps -p1` output.
pub fn parse_init_process(ps_output: &str) -> Option<InitProcess> {
    match init_marker().find(ps_output)?.as_str() {
        "systemd" => Some(InitProcess::Systemd),
        _ => Some(InitProcess::Init),
    }
}

/// Applies the detection precedence: a unit-based process 1 always wins,
/// then an installed supervisor, then a legacy init.
pub fn choose_backend(
    init: Option<InitProcess>,
    supervisor_available: bool,
) -> Option<BackendKind> {
    match (init, supervisor_available) {
        (Some(InitProcess::Systemd), _) => Some(BackendKind::Systemd),
        (_, true) => Some(BackendKind::Supervisor),
        (Some(InitProcess::Init), false) => Some(BackendKind::Sysv),
        (None, false) => None,
    }
}

/// Inspects the host and picks the backend to manage services with.
pub fn detect(host: &Host) -> Result<BackendKind> {
    let ps = host.output("ps", &["-p1"]).map_err(|err| {
        warn!("Unable to inspect process 1: {err}");
        DaemonError::UnsupportedSystem
    })?;
    if !ps.success {
        warn!("'ps -p1' exited with {:?}", ps.code);
        return Err(DaemonError::UnsupportedSystem);
    }
    let init = parse_init_process(&ps.stdout);
    debug!("Process 1 identified as {init:?}");

    let supervisor_available = init != Some(InitProcess::Systemd)
        && host
            .output("which", &[SUPERVISORD])
            .map(|output| output.success)
            .unwrap_or(false);

    let kind = choose_backend(init, supervisor_available)
        .ok_or(DaemonError::UnsupportedSystem)?;
    info!("Detected {kind} host");
    Ok(kind)
}
