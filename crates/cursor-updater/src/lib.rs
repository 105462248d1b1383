//! Self-updating installer for the Cursor editor AppImage.
//!
//! This crate decides whether a newer build is available, downloads the
//! platform artifact and installs it either system-wide or for the current
//! user, depending on privileges. It also keeps the recorded version and the
//! desktop launcher consistent with what is on disk.
//!
//! # Overview
//!
//! - Release metadata is refreshed by an external fetcher script and read
//!   from the version manifest it writes
//! - Versions are dotted integers compared numerically (`1.2 == 1.2.0`)
//! - Elevated runs install to `/usr/local/bin`, others to `~/.local/bin`
//! - Coexisting installs are reported as conflicts but never block a run
//! - Downloads stream to a scratch file and are moved into place atomically
//!
//! # Architecture
//!
//! [`RunContext`] resolves every path once. [`Installer`] runs the steps
//! against it, reading the manifest through a [`ManifestFetcher`] and the
//! artifact through an [`ArtifactSource`], and returns a [`RunReport`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::AtomicBool;
//! use cursor_updater::{HttpSource, Installer, NoProgress, RunContext, UpdaterConfig};
//!
//! fn update() -> cursor_updater::Result<i32> {
//!     let config = UpdaterConfig::default();
//!     let context = RunContext::detect(&config)?;
//!     let fetcher = context.external_fetcher(&config, None);
//!     let installer = Installer::new(config, context, fetcher, HttpSource::new()?);
//!
//!     let report = installer.run(&NoProgress, &AtomicBool::new(false));
//!     Ok(report.exit_code())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod error;
pub mod version;

// Paths and persisted state
pub mod context;
pub mod desktop;
pub mod locator;
pub mod version_store;

// Release metadata
pub mod fetcher;
pub mod manifest;

// Orchestration
pub mod installer;
pub mod steps;

// Re-export main types for convenience
pub use config::{FetcherConfig, LauncherTemplate, UpdaterConfig};
pub use context::RunContext;
pub use desktop::{ReconcileAction, reconcile};
pub use error::{Result, UpdateError};
pub use fetcher::{ExternalFetcher, FETCHER_DIR_VAR, ManifestFetcher};
pub use installer::{Installer, OperationTally, Outcome, RunReport};
pub use locator::{ConflictReason, InstallMode, InstallPaths, detect_conflicts};
pub use manifest::{LatestRelease, VersionManifest, resolve_artifact_url, select_latest};
pub use version::{Version, compare, is_newer};
pub use version_store::{VersionStore, WriteReport};

// Re-export step functions and types
pub use steps::download::{
    ArtifactSource, ArtifactStream, DownloadProgress, HttpSource, NoProgress, ProgressReporter,
    download_to_scratch, format_bytes,
};
pub use steps::install::install_artifact;

/// Current version of the updater.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!VERSION.is_empty());
    }
}
