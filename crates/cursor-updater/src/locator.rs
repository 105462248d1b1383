//! Install location resolution.
//!
//! There are two install roots: a system-wide one used when running elevated
//! and a per-user one otherwise. Both may exist on disk at the same time;
//! that is reported as a conflict but never blocks an update.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::UpdaterConfig;

/// Environment variable naming the user who invoked an elevated run.
pub const INVOKING_USER_VAR: &str = "SUDO_USER";

/// Which install root is authoritative for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    /// Installed for all users (requires elevated privileges).
    SystemWide,
    /// Installed under the invoking user's home.
    UserLocal,
}

impl InstallMode {
    /// Maps the effective privilege level to an install mode.
    #[must_use]
    pub const fn resolve(is_elevated: bool) -> Self {
        if is_elevated {
            Self::SystemWide
        } else {
            Self::UserLocal
        }
    }

    /// Whether this mode corresponds to an elevated run.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        matches!(self, Self::SystemWide)
    }

    /// Get a human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SystemWide => "System-wide",
            Self::UserLocal => "User-specific",
        }
    }
}

impl fmt::Display for InstallMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Returns `true` when the process runs with an effective UID of root.
#[allow(unsafe_code)]
#[must_use]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// The non-elevated user behind an elevated invocation, if any.
#[must_use]
pub fn invoking_user() -> Option<String> {
    std::env::var(INVOKING_USER_VAR)
        .ok()
        .filter(|user| !user.is_empty() && user != "root")
}

/// Resolves the home directory installs and desktop integration target.
///
/// Elevated runs with a known invoking user target that user's home rather
/// than root's, so the launcher and per-user files land where the human user
/// will see them.
#[must_use]
pub fn resolve_home(
    elevated: bool,
    invoking_user: Option<&str>,
    process_home: Option<PathBuf>,
) -> Option<PathBuf> {
    match invoking_user {
        Some(user) if elevated => Some(PathBuf::from("/home").join(user)),
        _ => process_home,
    }
}

/// The two candidate install locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// System-wide executable path.
    pub system: PathBuf,
    /// User-local executable path.
    pub user: PathBuf,
}

impl InstallPaths {
    /// Builds both paths from the configured conventions and a home directory.
    #[must_use]
    pub fn new(config: &UpdaterConfig, home: &Path) -> Self {
        Self {
            system: config.system_bin_dir.join(&config.binary_name),
            user: home.join(&config.user_bin_dir).join(&config.binary_name),
        }
    }

    /// The install path for the given mode.
    #[must_use]
    pub fn for_mode(&self, mode: InstallMode) -> &Path {
        match mode {
            InstallMode::SystemWide => &self.system,
            InstallMode::UserLocal => &self.user,
        }
    }

    /// Installs currently present on disk, system-wide first.
    #[must_use]
    pub fn existing(&self) -> Vec<(InstallMode, &Path)> {
        [
            (InstallMode::SystemWide, self.system.as_path()),
            (InstallMode::UserLocal, self.user.as_path()),
        ]
        .into_iter()
        .filter(|(_, path)| path.exists())
        .collect()
    }
}

/// Why co-existing installs may confuse the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Both a system-wide and a user-local install exist.
    BothInstallsPresent,
    /// Running elevated while a user-local install exists.
    ElevatedWithUserInstall,
    /// Running unelevated while a system-wide install exists.
    UnelevatedWithSystemInstall,
}

impl ConflictReason {
    /// Get a description of this conflict.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::BothInstallsPresent => {
                "Both system-wide and user-specific installations found"
            }
            Self::ElevatedWithUserInstall => {
                "Running with sudo but user-specific installation exists"
            }
            Self::UnelevatedWithSystemInstall => {
                "Running without sudo but system-wide installation exists"
            }
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Reports install layouts that may lead to running a stale copy.
///
/// When both installs exist only [`ConflictReason::BothInstallsPresent`] is
/// reported; a single install belonging to the other mode yields the matching
/// mode conflict. The result is advisory.
#[must_use]
pub fn detect_conflicts(paths: &InstallPaths, mode: InstallMode) -> Vec<ConflictReason> {
    let system = paths.system.exists();
    let user = paths.user.exists();

    let mut conflicts = Vec::new();
    if system && user {
        conflicts.push(ConflictReason::BothInstallsPresent);
    } else if mode.is_elevated() && user {
        conflicts.push(ConflictReason::ElevatedWithUserInstall);
    } else if !mode.is_elevated() && system {
        conflicts.push(ConflictReason::UnelevatedWithSystemInstall);
    }

    for conflict in &conflicts {
        tracing::warn!("Potential installation conflict: {}", conflict);
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn paths_in(root: &Path) -> InstallPaths {
        InstallPaths {
            system: root.join("usr/local/bin/cursor"),
            user: root.join("home/alice/.local/bin/cursor"),
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"appimage").unwrap();
    }

    #[test]
    fn test_resolve_mode() {
        assert_eq!(InstallMode::resolve(true), InstallMode::SystemWide);
        assert_eq!(InstallMode::resolve(false), InstallMode::UserLocal);
    }

    #[test]
    fn test_resolve_home_prefers_invoking_user_when_elevated() {
        let root_home = Some(PathBuf::from("/root"));
        assert_eq!(
            resolve_home(true, Some("alice"), root_home.clone()),
            Some(PathBuf::from("/home/alice"))
        );
        assert_eq!(resolve_home(true, None, root_home.clone()), root_home);
    }

    #[test]
    fn test_resolve_home_ignores_override_when_unelevated() {
        let home = Some(PathBuf::from("/home/bob"));
        assert_eq!(resolve_home(false, Some("alice"), home.clone()), home);
    }

    #[test]
    fn test_install_paths_from_config() {
        let config = UpdaterConfig::default();
        let paths = InstallPaths::new(&config, Path::new("/home/alice"));
        assert_eq!(paths.system, PathBuf::from("/usr/local/bin/cursor"));
        assert_eq!(paths.user, PathBuf::from("/home/alice/.local/bin/cursor"));
        assert_eq!(paths.for_mode(InstallMode::SystemWide), paths.system);
        assert_eq!(paths.for_mode(InstallMode::UserLocal), paths.user);
    }

    #[test]
    fn test_no_conflicts_without_installs() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());

        assert!(detect_conflicts(&paths, InstallMode::SystemWide).is_empty());
        assert!(detect_conflicts(&paths, InstallMode::UserLocal).is_empty());
        assert!(paths.existing().is_empty());
    }

    #[test]
    fn test_no_conflict_with_single_matching_install() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());

        touch(&paths.user);
        assert!(detect_conflicts(&paths, InstallMode::UserLocal).is_empty());
    }

    #[test]
    fn test_both_installs_is_exactly_one_conflict() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());
        touch(&paths.system);
        touch(&paths.user);

        for mode in [InstallMode::SystemWide, InstallMode::UserLocal] {
            let conflicts = detect_conflicts(&paths, mode);
            assert_eq!(conflicts, vec![ConflictReason::BothInstallsPresent]);
        }
        assert_eq!(paths.existing().len(), 2);
    }

    #[test]
    fn test_mode_mismatch_conflicts() {
        let dir = tempdir().unwrap();
        let paths = paths_in(dir.path());

        touch(&paths.user);
        assert_eq!(
            detect_conflicts(&paths, InstallMode::SystemWide),
            vec![ConflictReason::ElevatedWithUserInstall]
        );

        fs::remove_file(&paths.user).unwrap();
        touch(&paths.system);
        assert_eq!(
            detect_conflicts(&paths, InstallMode::UserLocal),
            vec![ConflictReason::UnelevatedWithSystemInstall]
        );
    }
}
