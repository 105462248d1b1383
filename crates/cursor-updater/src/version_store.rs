//! Persisted record of the installed version.
//!
//! The record is a plain-text file containing only the version string. It is
//! read from the first of several locations that exists, and written to the
//! primary location plus a legacy per-user mirror kept for older tooling.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};

/// Version record locations in read priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionStore {
    /// Primary, fixed location.
    pub primary: PathBuf,
    /// Legacy per-user backup location.
    pub legacy: PathBuf,
    /// Working-directory fallback (read only).
    pub fallback: PathBuf,
}

/// Outcome of writing the record to both locations.
#[derive(Debug)]
pub struct WriteReport {
    /// Result of writing the primary record.
    pub primary: Result<PathBuf>,
    /// Result of writing the legacy mirror.
    pub legacy: Result<PathBuf>,
}

impl VersionStore {
    /// Creates a store over explicit locations.
    #[must_use]
    pub fn new(primary: PathBuf, legacy: PathBuf, fallback: PathBuf) -> Self {
        Self {
            primary,
            legacy,
            fallback,
        }
    }

    /// All read locations, highest priority first.
    #[must_use]
    pub fn search_paths(&self) -> [&Path; 3] {
        [&self.primary, &self.legacy, &self.fallback]
    }

    /// Returns the recorded version from the first readable location.
    ///
    /// Unreadable or empty files are skipped with a warning. `None` means no
    /// prior install is known.
    #[must_use]
    pub fn read(&self) -> Option<String> {
        for path in self.search_paths() {
            if !path.exists() {
                continue;
            }

            match fs::read_to_string(path) {
                Ok(content) => {
                    let version = content.trim();
                    if version.is_empty() {
                        tracing::warn!("Version file {} is empty, skipping", path.display());
                        continue;
                    }
                    tracing::info!("Current installed version: {} ({})", version, path.display());
                    return Some(version.to_string());
                }
                Err(e) => {
                    tracing::warn!("Could not read version file {}: {}", path.display(), e);
                }
            }
        }

        tracing::info!("No existing version file found, will install latest version");
        None
    }

    /// Records `version` at the primary location and mirrors it to the
    /// legacy location. Each write is attempted independently.
    pub fn write(&self, version: &str) -> WriteReport {
        let primary = write_record(&self.primary, version);
        match &primary {
            Ok(path) => tracing::info!("Version file updated: {}", path.display()),
            Err(e) => tracing::warn!("Could not update primary version file: {}", e),
        }

        let legacy = write_record(&self.legacy, version);
        match &legacy {
            Ok(path) => tracing::info!("User version file updated: {}", path.display()),
            Err(e) => tracing::warn!("Could not update user version file: {}", e),
        }

        WriteReport { primary, legacy }
    }
}

fn write_record(path: &Path, version: &str) -> Result<PathBuf> {
    let fail = |e: std::io::Error| UpdateError::VersionRecordWriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    fs::write(path, version).map_err(fail)?;
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(root: &Path) -> VersionStore {
        VersionStore::new(
            root.join("opt/update-cursor/config/version.txt"),
            root.join("home/alice/.local/bin/cursor_version.txt"),
            root.join("cwd/cursor_version.txt"),
        )
    }

    #[test]
    fn test_read_absent() {
        let dir = tempdir().unwrap();
        assert_eq!(store_in(dir.path()).read(), None);
    }

    #[test]
    fn test_read_priority_order() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        fs::create_dir_all(store.fallback.parent().unwrap()).unwrap();
        fs::write(&store.fallback, "1.0.0").unwrap();
        assert_eq!(store.read().as_deref(), Some("1.0.0"));

        fs::create_dir_all(store.legacy.parent().unwrap()).unwrap();
        fs::write(&store.legacy, "1.1.0\n").unwrap();
        assert_eq!(store.read().as_deref(), Some("1.1.0"));

        fs::create_dir_all(store.primary.parent().unwrap()).unwrap();
        fs::write(&store.primary, "1.2.0").unwrap();
        assert_eq!(store.read().as_deref(), Some("1.2.0"));
    }

    #[test]
    fn test_unreadable_record_falls_through() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        // A directory where the primary file should be cannot be read as text.
        fs::create_dir_all(&store.primary).unwrap();
        fs::create_dir_all(store.legacy.parent().unwrap()).unwrap();
        fs::write(&store.legacy, "0.48.7").unwrap();

        assert_eq!(store.read().as_deref(), Some("0.48.7"));
    }

    #[test]
    fn test_empty_record_falls_through() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        fs::create_dir_all(store.primary.parent().unwrap()).unwrap();
        fs::write(&store.primary, "  \n").unwrap();
        fs::create_dir_all(store.fallback.parent().unwrap()).unwrap();
        fs::write(&store.fallback, "0.47.0").unwrap();

        assert_eq!(store.read().as_deref(), Some("0.47.0"));
    }

    #[test]
    fn test_write_creates_parents_and_mirrors() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let report = store.write("1.5.0");
        assert!(report.primary.is_ok());
        assert!(report.legacy.is_ok());
        assert_eq!(fs::read_to_string(&store.primary).unwrap(), "1.5.0");
        assert_eq!(fs::read_to_string(&store.legacy).unwrap(), "1.5.0");
        assert!(!store.fallback.exists());
    }

    #[test]
    fn test_mirror_failure_is_independent() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());

        // Parent of the legacy path is a regular file, so the mirror write fails.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        store.legacy = blocker.join("cursor_version.txt");

        let report = store.write("1.5.0");
        assert!(report.primary.is_ok());
        assert!(matches!(
            report.legacy,
            Err(UpdateError::VersionRecordWriteFailed { .. })
        ));
        assert_eq!(store.read().as_deref(), Some("1.5.0"));
    }
}
