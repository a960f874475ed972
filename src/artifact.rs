//! Generated artifacts on disk. The presence of a backend's artifact is what
//! "installed" means; there is no other persisted state.
use std::{
    fs::{self, OpenOptions},
    io::Write,
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::{DaemonError, Result};

/// Whether an artifact exists.
pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".svcwrap-tmp");
    let mut temp = path.to_path_buf();
    temp.set_file_name(name);
    temp
}

/// Writes `contents` to `path` atomically with the given mode.
///
/// The content goes to a sibling temp file which is synced and then renamed
/// over `path`, so readers never observe a partial artifact.
pub fn write_atomic(path: &Path, contents: &str, mode: u32) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| DaemonError::io(dir, source))?;
    }

    let temp = temp_path(path);
    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(&temp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&temp, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(DaemonError::io(path, source));
    }
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Deletes an artifact.
pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|source| DaemonError::io(path, source))?;
    debug!("Removed {}", path.display());
    Ok(())
}

/// Deletes an artifact during rollback, logging instead of failing.
pub fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path)
        && err.kind() != std::io::ErrorKind::NotFound
    {
        warn!("Failed to roll back {}: {err}", path.display());
    }
}
