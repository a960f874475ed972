//! Preparation of the service's log file.
use std::{
    fs::{self, DirBuilder, OpenOptions},
    os::unix::fs::DirBuilderExt,
    path::Path,
};

use tracing::{debug, warn};

use crate::{
    constants::LOG_DIR_MODE,
    error::{DaemonError, Result},
};

/// Makes sure `log_file` exists, creating its directory when needed.
///
/// An existing file is left untouched. If the directory had to be created but
/// the file still cannot be, the new directory is removed again.
pub fn ensure_log_file(log_file: &Path) -> Result<()> {
    if log_file.exists() {
        return Ok(());
    }

    let created_dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            DirBuilder::new()
                .recursive(true)
                .mode(LOG_DIR_MODE)
                .create(dir)
                .map_err(|source| DaemonError::io(dir, source))?;
            debug!("Created log directory {}", dir.display());
            Some(dir)
        }
        _ => None,
    };

    if let Err(source) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        if let Some(dir) = created_dir
            && let Err(err) = fs::remove_dir(dir)
        {
            warn!("Failed to remove log directory {}: {err}", dir.display());
        }
        return Err(DaemonError::io(log_file, source));
    }

    debug!("Created log file {}", log_file.display());
    Ok(())
}
