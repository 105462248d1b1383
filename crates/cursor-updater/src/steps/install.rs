//! Installation step: move the downloaded artifact into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, PersistError};

use crate::error::{Result, UpdateError};

/// Permission bits of an installed executable.
#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Marks `path` executable for everyone, writable by the owner.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
}

/// No permission bits to set on this platform.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Installs a downloaded artifact at `dest`, replacing any existing file.
///
/// The final step is always a rename, so `dest` is either the old file or
/// the complete new one. When the scratch file lives on another filesystem
/// it is first copied next to `dest`.
pub fn install_artifact(artifact: NamedTempFile, dest: &Path) -> Result<PathBuf> {
    let fail = |e: io::Error| UpdateError::InstallWriteFailed {
        path: dest.to_path_buf(),
        reason: e.to_string(),
    };

    tracing::info!("Installing to {}", dest.display());

    make_executable(artifact.path()).map_err(fail)?;

    let dest_dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dest_dir).map_err(fail)?;

    match artifact.persist(dest) {
        Ok(_) => {}
        Err(PersistError { error, file }) if error.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!("Scratch file is on another filesystem, copying to {}", dest_dir.display());
            copy_then_rename(file, dest_dir, dest).map_err(fail)?;
        }
        Err(PersistError { error, .. }) => return Err(fail(error)),
    }

    tracing::info!("Installed {}", dest.display());
    Ok(dest.to_path_buf())
}

fn copy_then_rename(source: NamedTempFile, dest_dir: &Path, dest: &Path) -> io::Result<()> {
    let mut reader = source.reopen()?;
    let mut staged = NamedTempFile::new_in(dest_dir)?;
    io::copy(&mut reader, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    make_executable(staged.path())?;
    staged.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
