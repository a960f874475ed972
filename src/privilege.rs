//! Privilege guard for life-cycle operations that touch system locations.
use tracing::debug;

use crate::{
    error::{DaemonError, Result},
    host::Host,
};

/// Ensures the caller runs with the root group.
///
/// Mirrors `id -g`: gid 0 passes, any other gid yields
/// [`DaemonError::RootPrivileges`]. If the group cannot be determined at all
/// the host is treated as unsupported.
pub fn check_privileges(host: &Host) -> Result<()> {
    let output = match host.output("id", &["-g"]) {
        Ok(output) if output.success => output,
        Ok(output) => {
            debug!("'id -g' failed with {:?}", output.code);
            return Err(DaemonError::UnsupportedSystem);
        }
        Err(err) => {
            debug!("'id -g' unavailable: {err}");
            return Err(DaemonError::UnsupportedSystem);
        }
    };

    match parse_gid(&output.stdout) {
        Some(0) => Ok(()),
        Some(_) => Err(DaemonError::RootPrivileges),
        None => Err(DaemonError::UnsupportedSystem),
    }
}

/// Parses the numeric group id printed by `id -g`.
pub fn parse_gid(output: &str) -> Option<u32> {
    output.trim().parse().ok()
}
