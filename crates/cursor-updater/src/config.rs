//! Path conventions and defaults for an updater profile.
//!
//! Everything that differs between deployments (where the binary goes, where
//! the version record lives, which helper refreshes the manifest) is captured
//! here so the pipeline itself has a single implementation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpdateError};

/// Well-known installation directory of the updater and its fetcher.
pub const DEFAULT_INSTALL_DIR: &str = "/opt/update-cursor";

/// Platform key of the only artifact the default profile installs.
pub const DEFAULT_PLATFORM_KEY: &str = "linux-x64";

/// Top-level updater configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Human-readable application name, used in messages.
    pub app_name: String,

    /// File name of the installed executable.
    pub binary_name: String,

    /// Directory for system-wide installs.
    pub system_bin_dir: PathBuf,

    /// Directory for user-local installs, relative to the user's home.
    pub user_bin_dir: PathBuf,

    /// Desktop launcher file, relative to the user's home.
    pub launcher_file: PathBuf,

    /// Primary version record location (absolute).
    pub primary_version_file: PathBuf,

    /// Legacy version record mirror, relative to the user's home.
    pub legacy_version_file: PathBuf,

    /// Last-resort version record, relative to the working directory.
    pub fallback_version_file: PathBuf,

    /// Key into each manifest entry's `platforms` map.
    pub platform_key: String,

    /// External fetcher settings.
    pub fetcher: FetcherConfig,

    /// Content used when a launcher file has to be created.
    pub launcher: LauncherTemplate,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            app_name: "Cursor".to_string(),
            binary_name: "cursor".to_string(),
            system_bin_dir: PathBuf::from("/usr/local/bin"),
            user_bin_dir: PathBuf::from(".local/bin"),
            launcher_file: PathBuf::from(".local/share/applications/cursor.desktop"),
            primary_version_file: Path::new(DEFAULT_INSTALL_DIR).join("config/version.txt"),
            legacy_version_file: PathBuf::from(".local/bin/cursor_version.txt"),
            fallback_version_file: PathBuf::from("cursor_version.txt"),
            platform_key: DEFAULT_PLATFORM_KEY.to_string(),
            fetcher: FetcherConfig::default(),
            launcher: LauncherTemplate::default(),
        }
    }
}

impl UpdaterConfig {
    /// Reads a configuration file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            UpdateError::InvalidConfig(format!(
                "cannot read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            UpdateError::InvalidConfig(format!(
                "invalid config file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Settings for the external manifest fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Fetcher script, relative to the fetcher root.
    pub script: PathBuf,

    /// Well-known fetcher root, searched last.
    pub install_dir: PathBuf,

    /// Runtime executable name looked up on `PATH`.
    pub runtime: String,

    /// Per-user runtime location, relative to the user's home. Preferred over `PATH`.
    pub runtime_home_path: PathBuf,

    /// Manifest written by the fetcher, relative to the fetcher root.
    pub manifest: PathBuf,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            script: PathBuf::from("updater/fetch_updates.ts"),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            runtime: "bun".to_string(),
            runtime_home_path: PathBuf::from(".bun/bin/bun"),
            manifest: PathBuf::from("data/version-history.json"),
        }
    }
}

/// Fields of a freshly created desktop launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherTemplate {
    /// `Name=` value.
    pub name: String,
    /// `Comment=` value.
    pub comment: String,
    /// Arguments appended after the executable on the `Exec=` line.
    pub exec_args: String,
    /// `Icon=` value.
    pub icon: String,
    /// `Categories=` value.
    pub categories: String,
    /// `StartupWMClass=` value.
    pub startup_wm_class: String,
}

impl Default for LauncherTemplate {
    fn default() -> Self {
        Self {
            name: "Cursor".to_string(),
            comment: "The AI-first code editor".to_string(),
            exec_args: "%U --no-sandbox".to_string(),
            icon: "cursor".to_string(),
            categories: "Development;TextEditor;".to_string(),
            startup_wm_class: "cursor".to_string(),
        }
    }
}
